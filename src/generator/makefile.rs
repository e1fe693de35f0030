//! Emits the makefile harness: the top-level makefile, the shared
//! implementation makefile, one makefile per configuration and the shared
//! variables file. The layout mirrors what the generated makefiles expect
//! at build time: objects under `build/<conf>/<platform>`, artifacts under
//! `dist/<conf>`.

use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;

use indoc::formatdoc;

use crate::config::items::ItemTool;
use crate::config::tools::{CompilerConfiguration, CompilerKind};
use crate::config::{ConfigurationDescriptor, ConfigurationType, MakeConfiguration};
use crate::errors::GeneratorError;
use crate::generator::{BUILD_DIR, DIST_DIR};
use crate::toolchain::descriptor::ToolKind;
use crate::toolchain::manager::CompilerSetManager;
use crate::toolchain::CompilerSet;
use crate::utility;

pub struct MakefileGenerator<'a> {
    descriptor: &'a ConfigurationDescriptor,
    manager: &'a CompilerSetManager,
}

impl<'a> MakefileGenerator<'a> {
    pub fn new(descriptor: &'a ConfigurationDescriptor, manager: &'a CompilerSetManager) -> Self {
        Self {
            descriptor,
            manager,
        }
    }

    /// Writes every makefile of the harness and returns the written paths.
    /// The top-level makefile is only created when absent, since users edit
    /// it; everything under `nbproject/` is owned by the generator.
    pub fn generate(&self) -> Result<Vec<PathBuf>, GeneratorError> {
        let base = &self.descriptor.base_dir;
        let mut written = Vec::new();

        let project_makefile = base.join(&self.descriptor.project_makefile_name);
        if !project_makefile.exists() {
            utility::write_file(&project_makefile, &self.project_makefile())?;
            written.push(project_makefile);
        }

        let impl_path = base.join("nbproject").join("Makefile-impl.mk");
        utility::write_file(&impl_path, &self.impl_makefile())?;
        written.push(impl_path);

        let variables_path = base.join("nbproject").join("Makefile-variables.mk");
        let existing = if variables_path.exists() {
            Some(utility::read_file(&variables_path)?)
        } else {
            None
        };
        utility::write_file(
            &variables_path,
            &self.variables_makefile(existing.as_deref()),
        )?;
        written.push(variables_path);

        // The private variables file belongs to the user; seed it once.
        let private_variables = base
            .join("nbproject")
            .join("private")
            .join("Makefile-variables.mk");
        if !private_variables.exists() {
            utility::write_file(
                &private_variables,
                "#\n# Generated - do not edit!\n#\n# NOCDDL\n#\n",
            )?;
            written.push(private_variables);
        }

        for conf in &self.descriptor.confs {
            let conf_path = base
                .join("nbproject")
                .join(format!("Makefile-{}.mk", conf.name));
            utility::write_file(&conf_path, &self.conf_makefile(conf))?;
            written.push(conf_path);
        }
        Ok(written)
    }

    fn default_conf_name(&self) -> &str {
        self.descriptor
            .active_configuration()
            .or_else(|| self.descriptor.confs.first())
            .map(|c| c.name.as_str())
            .unwrap_or("Default")
    }

    /// The user-editable entry makefile, generated once.
    pub fn project_makefile(&self) -> String {
        formatdoc!(
            r#"
            #
            # There exist several targets which are by default empty and which can be
            # used for execution of your targets. These targets are usually executed
            # before and after some main targets. They are:
            #
            #     .build-pre:              called before 'build' target
            #     .build-post:             called after 'build' target
            #     .clean-pre:              called before 'clean' target
            #     .clean-post:             called after 'clean' target
            #
            # Targets beyond this matter. This makefile dispatches every main target
            # to the generated implementation makefile.

            # Environment
            MKDIR=mkdir
            CP=cp
            CCADMIN=CCadmin

            # build
            build: .build-post

            .build-pre:

            .build-post: .build-impl

            # clean
            clean: .clean-post

            .clean-pre:

            .clean-post: .clean-impl

            # clobber
            clobber: .clobber-post

            .clobber-pre:

            .clobber-post: .clobber-impl

            # all
            all: .all-post

            .all-pre:

            .all-post: .all-impl

            # build tests
            build-tests: .build-tests-post

            .build-tests-pre:

            .build-tests-post: .build-tests-impl

            # run tests
            test: .test-post

            .test-pre: build-tests

            .test-post: .test-impl

            # help
            help: .help-post

            .help-pre:

            .help-post: .help-impl

            # include project implementation makefile
            include nbproject/Makefile-impl.mk

            # include project make variables
            include nbproject/Makefile-variables.mk
            "#
        )
    }

    /// The implementation makefile shared by all configurations, produced
    /// from a template with the project name, the configuration list and
    /// the default configuration substituted in.
    pub fn impl_makefile(&self) -> String {
        let conf_names: Vec<&str> = self.descriptor.confs.iter().map(|c| c.name.as_str()).collect();
        IMPL_TEMPLATE
            .replace("<PN>", &self.descriptor.project_name())
            .replace("<CNS>", &conf_names.join(" "))
            .replace("<CN>", self.default_conf_name())
    }

    /// The shared variables file. Regenerates the header and the block of
    /// every known configuration; any other content of the previous file is
    /// preserved verbatim after the generated part.
    pub fn variables_makefile(&self, existing: Option<&str>) -> String {
        let mut data = formatdoc!(
            r#"
            #
            # Generated - do not edit!
            #
            # NOCDDL
            #
            CND_BASEDIR=`pwd`
            CND_BUILDDIR={build}
            CND_DISTDIR={dist}
            "#,
            build = BUILD_DIR,
            dist = DIST_DIR,
        );
        for conf in &self.descriptor.confs {
            let set = self.compiler_set_for(conf);
            let platform = self.platform(set);
            let artifact = self.artifact_path(conf);
            let artifact_dir = parent_dir(&artifact);
            let artifact_name = file_name(&artifact);
            data.push_str(&formatdoc!(
                r#"
                # {name} configuration
                CND_PLATFORM_{name}={platform}
                CND_ARTIFACT_DIR_{name}={artifact_dir}
                CND_ARTIFACT_NAME_{name}={artifact_name}
                CND_ARTIFACT_PATH_{name}={artifact}
                CND_PACKAGE_DIR_{name}={dist}/{name}/package
                CND_PACKAGE_NAME_{name}={package_name}
                CND_PACKAGE_PATH_{name}={dist}/{name}/package/{package_name}
                "#,
                name = conf.name,
                platform = platform,
                artifact_dir = artifact_dir,
                artifact_name = artifact_name,
                artifact = artifact,
                dist = DIST_DIR,
                package_name = crate::generator::packaging::package_name(self.descriptor, conf),
            ));
        }
        if let Some(existing) = existing {
            let foreign = foreign_lines(existing, &self.descriptor.confs);
            if !foreign.is_empty() {
                for line in foreign {
                    data.push_str(&line);
                    data.push('\n');
                }
            }
        }
        data
    }

    /// The per-configuration makefile.
    pub fn conf_makefile(&self, conf: &MakeConfiguration) -> String {
        let set = self.compiler_set_for(conf);
        let mut data = formatdoc!(
            r#"
            #
            # Generated Makefile - do not edit!
            #
            # Edit the Makefile in the project folder instead (../Makefile). Each target
            # has a -pre and a -post target defined where you can add customized code.
            #
            # This makefile implements configuration specific macros and targets.


            "#
        );
        data.push_str(&self.environment_block(conf, set));
        data.push_str(&self.macros_block(conf, set));
        data.push_str("\n# Include project Makefile\ninclude Makefile\n\n");

        if conf.configuration_type.is_makefile_driven() {
            data.push_str(&self.external_targets(conf));
        } else if conf.configuration_type.is_qt() {
            data.push_str(&self.qt_targets(conf));
        } else {
            match set {
                Some(set) if set_is_usable(set) => {
                    data.push_str(&self.compile_targets(conf, set))
                }
                _ => data.push_str(&self.stub_targets(conf)),
            }
        }

        data.push_str(&self.subproject_targets(conf));

        if conf.dependency_checking.value()
            && !conf.configuration_type.is_makefile_driven()
            && set.map_or(false, set_is_usable)
        {
            data.push_str(
                "\n# Enable dependency checking\n.dep.inc: .depcheck-impl\n\ninclude .dep.inc\n",
            );
        }
        data
    }

    fn compiler_set_for(&self, conf: &MakeConfiguration) -> Option<&CompilerSet> {
        self.manager
            .find(conf.compiler_set.value())
            .or_else(|| self.manager.default_set())
    }

    fn platform(&self, set: Option<&CompilerSet>) -> String {
        let flavor = set.map(|s| s.flavor.as_str()).unwrap_or("Default");
        format!("{}-{}", flavor, std::env::consts::OS)
    }

    fn environment_block(&self, _conf: &MakeConfiguration, set: Option<&CompilerSet>) -> String {
        let tool = |kind: ToolKind, fallback: &str| -> String {
            set.and_then(|s| s.tool(kind))
                .filter(|t| t.is_bound())
                .map(|t| t.path.display().to_string())
                .unwrap_or_else(|| fallback.to_string())
        };
        formatdoc!(
            r#"
            # Environment
            MKDIR=mkdir
            CP=cp
            GREP=grep
            NM=nm
            CCADMIN=CCadmin
            RANLIB=ranlib
            CC={cc}
            CCC={ccc}
            CXX={ccc}
            FC={fc}
            AS={as_}

            "#,
            cc = tool(ToolKind::C, "gcc"),
            ccc = tool(ToolKind::Cpp, "g++"),
            fc = tool(ToolKind::Fortran, "gfortran"),
            as_ = tool(ToolKind::Assembler, "as"),
        )
    }

    fn macros_block(&self, conf: &MakeConfiguration, set: Option<&CompilerSet>) -> String {
        formatdoc!(
            r#"
            # Macros
            CND_PLATFORM={platform}
            CND_DLIB_EXT={dlib}
            CND_CONF={name}
            CND_DISTDIR={dist}
            CND_BUILDDIR={build}

            "#,
            platform = self.platform(set),
            dlib = dynamic_library_extension(),
            name = conf.name,
            dist = DIST_DIR,
            build = BUILD_DIR,
        )
    }

    fn stub_targets(&self, conf: &MakeConfiguration) -> String {
        formatdoc!(
            r#"
            # Build Targets
            .build-conf:
            	@echo "Configuration \"{name}\" refers to compiler set \"{set}\" which was not found on this host."
            	@echo "Resolve the toolchain (see the toolchains command) and regenerate."
            	@exit 1

            # Clean Targets
            .clean-conf:
            	${{RM}} -r {build}/{name}

            "#,
            name = conf.name,
            set = conf.compiler_set.value(),
            build = BUILD_DIR,
        )
    }

    fn external_targets(&self, conf: &MakeConfiguration) -> String {
        let working_directory = conf.makefile.working_directory.value();
        formatdoc!(
            r#"
            # Build Targets
            .build-conf: ${{BUILD_SUBPROJECTS}}
            	cd {wd} && {build}

            # Clean Targets
            .clean-conf: ${{CLEAN_SUBPROJECTS}}
            	cd {wd} && {clean}

            "#,
            wd = working_directory,
            build = conf.makefile.build_command.value(),
            clean = conf.makefile.clean_command.value(),
        )
    }

    fn qt_targets(&self, conf: &MakeConfiguration) -> String {
        let spec = qmake_spec(conf)
            .map(|spec| format!(" -spec {}", spec))
            .unwrap_or_default();
        let defs = if conf.qt.custom_defs.is_empty() {
            String::new()
        } else {
            format!(" \"DEFINES += {}\"", conf.qt.custom_defs.value().join(" "))
        };
        formatdoc!(
            r#"
            # Qt Targets
            nbproject/qt-{name}.mk: nbproject/qt-{name}.pro FORCE
            	${{QMAKE}}{spec} VPATH=. -o qttmp-{name}.mk nbproject/qt-{name}.pro{defs}
            	mv -f qttmp-{name}.mk nbproject/qt-{name}.mk

            FORCE:

            # Build Targets
            .build-conf: ${{BUILD_SUBPROJECTS}} nbproject/qt-{name}.mk
            	"${{MAKE}}" -f nbproject/qt-{name}.mk {artifact}

            # Clean Targets
            .clean-conf: ${{CLEAN_SUBPROJECTS}}
            	"${{MAKE}}" -f nbproject/qt-{name}.mk distclean
            	${{RM}} nbproject/qt-{name}.mk
            	${{RM}} -r {build}/{name}

            "#,
            name = conf.name,
            spec = spec,
            artifact = self.artifact_path(conf),
            build = BUILD_DIR,
        )
    }

    fn compile_targets(&self, conf: &MakeConfiguration, set: &CompilerSet) -> String {
        let items = self.compiled_items(conf);
        let test_items = self.compiled_test_items(conf);
        let artifact = self.artifact_path(conf);
        let mut data = String::new();

        data.push_str("# Object Directory\n");
        data.push_str("OBJECTDIR=${CND_BUILDDIR}/${CND_CONF}/${CND_PLATFORM}\n\n");
        data.push_str("# Object Files\nOBJECTFILES=");
        for item in &items {
            data.push_str(" \\\n\t");
            data.push_str(&object_path(item));
        }
        data.push_str("\n\n");

        if !test_items.is_empty() {
            data.push_str("# Test Directory\n");
            data.push_str("TESTDIR=${CND_BUILDDIR}/${CND_CONF}/${CND_PLATFORM}/tests\n\n");
            data.push_str("# Test Files\nTESTFILES= \\\n\t${TESTDIR}/TestFiles/f1\n\n");
        }

        data.push_str(&formatdoc!(
            r#"
            # Link Libraries and Options
            LDLIBSOPTIONS={ldlibs}

            # Build Targets
            .build-conf: ${{BUILD_SUBPROJECTS}}
            	"${{MAKE}}" -f nbproject/Makefile-{name}.mk {artifact}

            "#,
            ldlibs = conf.linker.options_string(),
            name = conf.name,
            artifact = artifact,
        ));

        if conf.configuration_type.is_archive() {
            data.push_str(&formatdoc!(
                r#"
                {artifact}: ${{OBJECTFILES}}
                	${{MKDIR}} -p {artifact_dir}
                	${{RM}} {artifact}
                	${{AR}} -rv {artifact} ${{OBJECTFILES}}
                {ranlib}
                "#,
                artifact = artifact,
                artifact_dir = parent_dir(&artifact),
                ranlib = if conf.archiver.run_ranlib.value() {
                    format!("\t$(RANLIB) {}\n", artifact)
                } else {
                    String::new()
                },
            ));
        } else {
            let driver = link_driver(set, &items);
            data.push_str(&formatdoc!(
                r#"
                {artifact}: ${{OBJECTFILES}}
                	${{MKDIR}} -p {artifact_dir}
                	{driver} -o {artifact} ${{OBJECTFILES}} ${{LDLIBSOPTIONS}}{shared}

                "#,
                artifact = artifact,
                artifact_dir = parent_dir(&artifact),
                driver = driver,
                shared = if conf.configuration_type == ConfigurationType::DynamicLibrary {
                    " -shared -fPIC"
                } else {
                    ""
                },
            ));
        }

        for item in &items {
            data.push_str(&self.object_rule(conf, item, false));
        }

        if !test_items.is_empty() {
            data.push_str(&self.test_targets(conf, set, &items, &test_items));
        }

        data.push_str(&formatdoc!(
            r#"
            # Clean Targets
            .clean-conf: ${{CLEAN_SUBPROJECTS}}
            	${{RM}} -r ${{CND_BUILDDIR}}/${{CND_CONF}}
            	${{RM}} {artifact}

            "#,
            artifact = artifact,
        ));
        data
    }

    /// The compile rule for one item. `nomain` variants rename `main` away
    /// so test binaries can link against the project's objects.
    fn object_rule(&self, conf: &MakeConfiguration, item: &Rc<str>, nomain: bool) -> String {
        let kind = compile_kind(conf, item);
        let (compile_macro, standard) = match kind {
            CompilerKind::C => ("$(COMPILE.c)", standard_flag(conf, CompilerKind::C)),
            CompilerKind::Cpp => ("$(COMPILE.cc)", standard_flag(conf, CompilerKind::Cpp)),
            CompilerKind::Fortran => ("$(COMPILE.f)", None),
            CompilerKind::Assembler => ("$(COMPILE.s)", None),
        };
        let merged = self.merged_compiler(conf, kind, item);
        let mut options = mode_flags(&merged).to_string();
        if let Some(warnings) = warning_flags(&merged) {
            options.push(' ');
            options.push_str(warnings);
        }
        if let Some(standard) = standard {
            options.push(' ');
            options.push_str(&standard);
        }
        if conf.configuration_type == ConfigurationType::DynamicLibrary {
            options.push_str(" -fPIC");
        }
        let tool_options = merged.options_string();
        if !tool_options.is_empty() {
            options.push(' ');
            options.push_str(&tool_options);
        }
        if nomain {
            options.push_str(" -Dmain=__nomain");
        }

        let object = if nomain {
            nomain_object_path(item)
        } else {
            object_path(item)
        };
        formatdoc!(
            r#"
            {object}: {source}
            	${{MKDIR}} -p {object_dir}
            	${{RM}} "$@.d"
            	{compile} {options} -MMD -MP -MF "$@.d" -o {object} {source}

            "#,
            object = object,
            source = item,
            object_dir = parent_dir(&object),
            compile = compile_macro,
            options = options.trim(),
        )
    }

    fn test_targets(
        &self,
        conf: &MakeConfiguration,
        set: &CompilerSet,
        items: &[Rc<str>],
        test_items: &[Rc<str>],
    ) -> String {
        let mut data = String::new();
        let driver = link_driver_for_tests(set, items, test_items);

        data.push_str("# Build Test Targets\n");
        data.push_str(&formatdoc!(
            r#"
            .build-tests-conf: .build-conf ${{TESTFILES}}

            ${{TESTDIR}}/TestFiles/f1: {test_objects} ${{OBJECTFILES:.o=_nomain.o}}
            	${{MKDIR}} -p ${{TESTDIR}}/TestFiles
            	{driver} -o ${{TESTDIR}}/TestFiles/f1 {test_objects} ${{OBJECTFILES:.o=_nomain.o}} ${{LDLIBSOPTIONS}}

            "#,
            test_objects = test_items
                .iter()
                .map(|i| test_object_path(i))
                .collect::<Vec<_>>()
                .join(" "),
            driver = driver,
        ));

        for item in test_items {
            let kind = compile_kind(conf, item);
            let compile_macro = match kind {
                CompilerKind::C => "$(COMPILE.c)",
                CompilerKind::Cpp => "$(COMPILE.cc)",
                CompilerKind::Fortran => "$(COMPILE.f)",
                CompilerKind::Assembler => "$(COMPILE.s)",
            };
            let merged = self.merged_compiler(conf, kind, item);
            let object = test_object_path(item);
            data.push_str(&formatdoc!(
                r#"
                {object}: {source}
                	${{MKDIR}} -p {object_dir}
                	${{RM}} "$@.d"
                	{compile} {mode} {options} -MMD -MP -MF "$@.d" -o {object} {source}

                "#,
                object = object,
                source = item,
                object_dir = parent_dir(&object),
                compile = compile_macro,
                mode = mode_flags(&merged),
                options = merged.options_string(),
            ));
        }

        // Every main-list object gets a harness twin with main renamed.
        for item in items {
            data.push_str(&self.object_rule(conf, item, true));
        }

        data.push_str(&formatdoc!(
            r#"
            # Run Test Targets
            .test-conf:
            	@${{TESTDIR}}/TestFiles/f1 || true

            "#
        ));
        data
    }

    fn subproject_targets(&self, conf: &MakeConfiguration) -> String {
        let mut build = String::from("# Subprojects\n.build-subprojects:\n");
        let mut clean = String::from("\n.clean-subprojects:\n");
        for artifact in &conf.required_projects {
            if !artifact.build {
                continue;
            }
            build.push_str(&format!(
                "\tcd {} && {}\n",
                artifact.working_directory, artifact.build_command
            ));
            clean.push_str(&format!(
                "\tcd {} && {}\n",
                artifact.working_directory, artifact.clean_command
            ));
        }
        build.push_str(&clean);
        build
    }

    /// Items compiled into the main object list: not excluded, not under a
    /// test folder, and buildable by a compiler.
    fn compiled_items(&self, conf: &MakeConfiguration) -> Vec<Rc<str>> {
        let test_items: HashSet<Rc<str>> = self.descriptor.test_items().into_iter().collect();
        self.descriptor
            .sorted_items()
            .into_iter()
            .filter(|item| !test_items.contains(item))
            .filter(|item| !conf.is_item_excluded(item))
            .filter(|item| is_compiled(conf, item))
            .collect()
    }

    fn compiled_test_items(&self, conf: &MakeConfiguration) -> Vec<Rc<str>> {
        self.descriptor
            .test_items()
            .into_iter()
            .filter(|item| !conf.is_item_excluded(item))
            .filter(|item| is_compiled(conf, item))
            .collect()
    }

    /// Project, then folder, then item settings folded into one bag.
    fn merged_compiler(
        &self,
        conf: &MakeConfiguration,
        kind: CompilerKind,
        item: &str,
    ) -> CompilerConfiguration {
        let mut merged = match kind {
            CompilerKind::C => conf.c_compiler.clone(),
            CompilerKind::Cpp => conf.cpp_compiler.clone(),
            CompilerKind::Fortran => conf.fortran_compiler.clone(),
            CompilerKind::Assembler => conf.assembler.clone(),
        };
        if let Some(folder) = longest_folder_override(conf, item) {
            let compiler = match kind {
                CompilerKind::Cpp => folder.cpp.as_ref(),
                _ => folder.c.as_ref(),
            };
            if let Some(compiler) = compiler {
                overlay(&mut merged, compiler);
            }
        }
        if let Some(item_configuration) = conf.item_configurations.get(item) {
            if let Some(compiler) = item_configuration.compiler(kind) {
                overlay(&mut merged, compiler);
            }
        }
        merged
    }

    fn artifact_path(&self, conf: &MakeConfiguration) -> String {
        artifact_path(self.descriptor, conf)
    }
}

/// Where a configuration's artifact lands, honoring explicit output paths
/// before falling back to the conventional `dist/<conf>/...` location.
pub fn artifact_path(descriptor: &ConfigurationDescriptor, conf: &MakeConfiguration) -> String {
    if conf.configuration_type.is_archive() && conf.archiver.output.modified() {
        return conf.archiver.output.value().to_string();
    }
    if conf.linker.output.modified() {
        return conf.linker.output.value().to_string();
    }
    if conf.configuration_type.is_makefile_driven() {
        let path = conf.makefile.executable_path.value();
        if !path.is_empty() {
            return path.to_string();
        }
    }
    let project = descriptor.project_name();
    match conf.configuration_type {
        ConfigurationType::DynamicLibrary | ConfigurationType::QtDynamicLibrary => format!(
            "{}/{}/lib{}.{}",
            DIST_DIR,
            conf.name,
            project,
            dynamic_library_extension()
        ),
        ConfigurationType::StaticLibrary | ConfigurationType::QtStaticLibrary => {
            format!("{}/{}/lib{}.a", DIST_DIR, conf.name, project)
        }
        _ => format!("{}/{}/{}", DIST_DIR, conf.name, project),
    }
}

fn set_is_usable(set: &CompilerSet) -> bool {
    [ToolKind::C, ToolKind::Cpp]
        .iter()
        .any(|kind| set.tool(*kind).map_or(false, |t| t.is_bound()))
}

/// The link driver. An explicit hint from the toolchain descriptor wins;
/// otherwise the source mix decides: any C++ pulls in ${LINK.cc}, a pure
/// Fortran project links with ${LINK.f}, everything else with ${LINK.c}.
fn link_driver(set: &CompilerSet, items: &[Rc<str>]) -> &'static str {
    if let Some(hint) = &set.link_driver_hint {
        return match hint.as_str() {
            "cxx" => "${LINK.cc}",
            "fortran" => "${LINK.f}",
            _ => "${LINK.c}",
        };
    }
    let kinds: Vec<ItemTool> = items
        .iter()
        .filter_map(|item| ItemTool::from_extension(item))
        .collect();
    if kinds.contains(&ItemTool::Compiler(CompilerKind::Cpp)) {
        "${LINK.cc}"
    } else if !kinds.is_empty()
        && kinds
            .iter()
            .all(|k| *k == ItemTool::Compiler(CompilerKind::Fortran))
    {
        "${LINK.f}"
    } else {
        "${LINK.c}"
    }
}

fn link_driver_for_tests(
    set: &CompilerSet,
    items: &[Rc<str>],
    test_items: &[Rc<str>],
) -> &'static str {
    let mut all: Vec<Rc<str>> = items.to_vec();
    all.extend(test_items.iter().cloned());
    link_driver(set, &all)
}

fn is_compiled(conf: &MakeConfiguration, item: &str) -> bool {
    let tool = conf
        .item_configurations
        .get(item)
        .and_then(|i| i.tool)
        .or_else(|| ItemTool::from_extension(item));
    matches!(tool, Some(ItemTool::Compiler(_)))
}

fn compile_kind(conf: &MakeConfiguration, item: &str) -> CompilerKind {
    let tool = conf
        .item_configurations
        .get(item)
        .and_then(|i| i.tool)
        .or_else(|| ItemTool::from_extension(item));
    match tool {
        Some(ItemTool::Compiler(kind)) => kind,
        _ => CompilerKind::C,
    }
}

fn overlay(base: &mut CompilerConfiguration, over: &CompilerConfiguration) {
    if over.development_mode.modified() {
        base.development_mode.set_value(over.development_mode.value());
    }
    if over.warning_level.modified() {
        base.warning_level.set_value(over.warning_level.value());
    }
    if over.strip.modified() {
        base.strip.set_value(over.strip.value());
    }
    if over.standard.modified() {
        base.standard.set_value(over.standard.value());
    }
    if over.preprocessor_definitions.modified() {
        base.preprocessor_definitions
            .set_value(over.preprocessor_definitions.value().to_vec());
    }
    if over.include_directories.modified() {
        base.include_directories
            .set_value(over.include_directories.value().to_vec());
    }
    if over.include_files.modified() {
        base.include_files.set_value(over.include_files.value().to_vec());
    }
    if over.important_flags.modified() {
        base.important_flags.set_value(over.important_flags.value());
    }
    if over.command_line.modified() {
        base.command_line.set_value(over.command_line.value());
    }
    if over.tool.modified() {
        base.tool.set_value(over.tool.value());
    }
}

fn longest_folder_override<'a>(
    conf: &'a MakeConfiguration,
    item: &str,
) -> Option<&'a crate::config::items::FolderConfiguration> {
    conf.folder_configurations
        .iter()
        .filter(|(path, _)| item.starts_with(&format!("{}/", path)))
        .max_by_key(|(path, _)| path.len())
        .map(|(_, folder)| folder)
}

fn mode_flags(compiler: &CompilerConfiguration) -> &'static str {
    match compiler.development_mode.value() {
        0 => "",
        1 => "-g",
        2 => "-g -O",
        3 => "-g --coverage",
        4 => "-g -O2",
        5 => "-O2",
        6 => "-O3",
        _ => "",
    }
}

fn warning_flags(compiler: &CompilerConfiguration) -> Option<&'static str> {
    match compiler.warning_level.value() {
        0 => Some("-w"),
        3 => Some("-Wall"),
        4 => Some("-Wall -Werror"),
        _ => None,
    }
}

fn standard_flag(conf: &MakeConfiguration, kind: CompilerKind) -> Option<String> {
    let compiler = match kind {
        CompilerKind::C => &conf.c_compiler,
        CompilerKind::Cpp => &conf.cpp_compiler,
        _ => return None,
    };
    if !compiler.standard.modified() {
        return None;
    }
    let flag = match (kind, compiler.standard.value()) {
        (CompilerKind::C, 1) => "-std=c89",
        (CompilerKind::C, 2) => "-std=c99",
        (CompilerKind::C, 3) => "-std=c11",
        (CompilerKind::Cpp, 1) => "-std=c++98",
        (CompilerKind::Cpp, 2) => "-std=c++11",
        (CompilerKind::Cpp, 3) => "-std=c++14",
        _ => return None,
    };
    Some(flag.to_string())
}

/// Default qmake spec by platform when the configuration has no explicit
/// one. Linux builds use qmake's own default.
fn qmake_spec(conf: &MakeConfiguration) -> Option<String> {
    if conf.qt.qmake_spec.modified() {
        return Some(conf.qt.qmake_spec.value().to_string());
    }
    match std::env::consts::OS {
        "macos" => Some("macx-g++".to_string()),
        "windows" => Some("win32-g++".to_string()),
        "solaris" => Some("solaris-cc".to_string()),
        _ => None,
    }
}

fn dynamic_library_extension() -> &'static str {
    match std::env::consts::OS {
        "macos" => "dylib",
        "windows" => "dll",
        _ => "so",
    }
}

/// `src/main.c` becomes `${OBJECTDIR}/src/main.o`. Paths escaping the
/// project directory are folded under `_ext` so objects stay inside the
/// build tree.
fn object_path(item: &str) -> String {
    format!("${{OBJECTDIR}}/{}.o", stem_for(item))
}

fn nomain_object_path(item: &str) -> String {
    format!("${{OBJECTDIR}}/{}_nomain.o", stem_for(item))
}

fn test_object_path(item: &str) -> String {
    format!("${{TESTDIR}}/{}.o", stem_for(item))
}

fn stem_for(item: &str) -> String {
    let safe = item.replace("..", "_ext");
    match safe.rsplit_once('.') {
        Some((stem, _extension)) => stem.to_string(),
        None => safe,
    }
}

fn parent_dir(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => ".".to_string(),
    }
}

fn file_name(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((_, name)) => name.to_string(),
        None => path.to_string(),
    }
}

/// Lines of the previous variables file that the generator does not own:
/// anything outside the generated header and the blocks of known
/// configurations.
fn foreign_lines(existing: &str, confs: &[MakeConfiguration]) -> Vec<String> {
    let known_markers: Vec<String> = confs
        .iter()
        .map(|c| format!("# {} configuration", c.name))
        .collect();
    let generated_prefixes: Vec<String> = confs
        .iter()
        .flat_map(|c| {
            [
                format!("CND_PLATFORM_{}=", c.name),
                format!("CND_ARTIFACT_DIR_{}=", c.name),
                format!("CND_ARTIFACT_NAME_{}=", c.name),
                format!("CND_ARTIFACT_PATH_{}=", c.name),
                format!("CND_PACKAGE_DIR_{}=", c.name),
                format!("CND_PACKAGE_NAME_{}=", c.name),
                format!("CND_PACKAGE_PATH_{}=", c.name),
            ]
        })
        .collect();
    let header = [
        "#",
        "# Generated - do not edit!",
        "# NOCDDL",
        "CND_BASEDIR=`pwd`",
        &format!("CND_BUILDDIR={}", BUILD_DIR),
        &format!("CND_DISTDIR={}", DIST_DIR),
    ]
    .map(String::from);

    existing
        .lines()
        .filter(|line| {
            !header.contains(&line.to_string())
                && !known_markers.iter().any(|m| line == m)
                && !generated_prefixes.iter().any(|p| line.starts_with(p.as_str()))
                && !line.trim().is_empty()
        })
        .map(|line| line.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use tempdir::TempDir;

    use crate::config::items::{Folder, FolderKind};
    use crate::toolchain::Tool;

    fn gnu_set() -> CompilerSet {
        let mut set = CompilerSet::new("GNU", "GNU", Path::new("/usr/bin"));
        set.tools
            .push(Tool::new(ToolKind::C, "gcc", Path::new("/usr/bin/gcc")));
        set.tools
            .push(Tool::new(ToolKind::Cpp, "g++", Path::new("/usr/bin/g++")));
        set
    }

    fn manager() -> CompilerSetManager {
        CompilerSetManager::from_sets("localhost", vec![gnu_set()])
    }

    fn descriptor(items: &[&str]) -> ConfigurationDescriptor {
        let mut descriptor = ConfigurationDescriptor::new(Path::new("/tmp/app"));
        for item in items {
            descriptor.logical_folders.add_item(Rc::from(*item));
        }
        descriptor.confs.push(MakeConfiguration::new(
            "Debug",
            ConfigurationType::Application,
        ));
        descriptor.active = Some(0);
        descriptor
    }

    #[test]
    fn mixed_c_and_cpp_sources_link_with_the_cpp_driver() {
        let _lock = crate::tests::EnvLock::new();
        let descriptor = descriptor(&["a.c", "b.cpp"]);
        let manager = manager();
        let generator = MakefileGenerator::new(&descriptor, &manager);
        let makefile = generator.conf_makefile(&descriptor.confs[0]);
        assert!(makefile.contains("${LINK.cc} -o dist/Debug/app"));
        assert!(makefile.contains("${OBJECTDIR}/a.o"));
        assert!(makefile.contains("${OBJECTDIR}/b.o"));
        assert!(makefile.contains("$(COMPILE.c)"));
        assert!(makefile.contains("$(COMPILE.cc)"));
    }

    #[test]
    fn pure_c_sources_link_with_the_c_driver() {
        let _lock = crate::tests::EnvLock::new();
        let descriptor = descriptor(&["a.c", "b.c"]);
        let manager = manager();
        let generator = MakefileGenerator::new(&descriptor, &manager);
        let makefile = generator.conf_makefile(&descriptor.confs[0]);
        assert!(makefile.contains("${LINK.c} -o"));
        assert!(!makefile.contains("${LINK.cc}"));
    }

    #[test]
    fn descriptor_hint_overrides_the_source_scan() {
        let _lock = crate::tests::EnvLock::new();
        let mut set = gnu_set();
        set.link_driver_hint = Some("cxx".to_string());
        let manager = CompilerSetManager::from_sets("localhost", vec![set]);
        let descriptor = descriptor(&["a.c"]);
        let generator = MakefileGenerator::new(&descriptor, &manager);
        let makefile = generator.conf_makefile(&descriptor.confs[0]);
        assert!(makefile.contains("${LINK.cc} -o"));
    }

    #[test]
    fn excluded_items_are_left_out_of_the_object_list() {
        let _lock = crate::tests::EnvLock::new();
        let mut descriptor = descriptor(&["a.c", "b.c"]);
        descriptor.confs[0]
            .item_configuration_mut(Rc::from("b.c"))
            .excluded
            .set_value(true);
        let manager = manager();
        let generator = MakefileGenerator::new(&descriptor, &manager);
        let makefile = generator.conf_makefile(&descriptor.confs[0]);
        assert!(makefile.contains("${OBJECTDIR}/a.o"));
        assert!(!makefile.contains("${OBJECTDIR}/b.o"));
    }

    #[test]
    fn unresolved_toolchain_produces_a_failing_stub() {
        let _lock = crate::tests::EnvLock::new();
        let manager = CompilerSetManager::from_sets("localhost", Vec::new());
        let descriptor = descriptor(&["a.c"]);
        let generator = MakefileGenerator::new(&descriptor, &manager);
        let makefile = generator.conf_makefile(&descriptor.confs[0]);
        assert!(makefile.contains("@exit 1"));
        assert!(!makefile.contains("${LINK.c}"));
    }

    #[test]
    fn makefile_driven_configuration_delegates_to_its_commands() {
        let _lock = crate::tests::EnvLock::new();
        let mut descriptor = ConfigurationDescriptor::new(Path::new("/tmp/app"));
        let mut conf = MakeConfiguration::new("Default", ConfigurationType::Makefile);
        conf.makefile.working_directory.set_value("sub");
        conf.makefile.build_command.set_value("${MAKE} -f Makefile.ext");
        descriptor.confs.push(conf);
        let manager = manager();
        let generator = MakefileGenerator::new(&descriptor, &manager);
        let makefile = generator.conf_makefile(&descriptor.confs[0]);
        assert!(makefile.contains("cd sub && ${MAKE} -f Makefile.ext"));
    }

    #[test]
    fn item_override_reaches_the_compile_line() {
        let _lock = crate::tests::EnvLock::new();
        let mut descriptor = descriptor(&["a.c"]);
        {
            let conf = &mut descriptor.confs[0];
            conf.c_compiler.preprocessor_definitions.add("GLOBAL");
            conf.item_configuration_mut(Rc::from("a.c"))
                .compiler_mut(CompilerKind::C)
                .important_flags
                .set_value("-fno-builtin");
        }
        let manager = manager();
        let generator = MakefileGenerator::new(&descriptor, &manager);
        let makefile = generator.conf_makefile(&descriptor.confs[0]);
        assert!(makefile.contains("-DGLOBAL"));
        assert!(makefile.contains("-fno-builtin"));
    }

    #[test]
    fn test_items_build_into_the_test_harness_with_nomain_twins() {
        let _lock = crate::tests::EnvLock::new();
        let mut descriptor = descriptor(&["src/main.c"]);
        let mut tests_folder = Folder::new("tests", FolderKind::TestLogicalFolder);
        tests_folder.add_item(Rc::from("tests/test_main.c"));
        descriptor.logical_folders.folders.push(tests_folder);
        let manager = manager();
        let generator = MakefileGenerator::new(&descriptor, &manager);
        let makefile = generator.conf_makefile(&descriptor.confs[0]);
        assert!(makefile.contains("${TESTDIR}/tests/test_main.o"));
        assert!(makefile.contains("${OBJECTDIR}/src/main_nomain.o"));
        assert!(makefile.contains("-Dmain=__nomain"));
        // The test source itself keeps its own main.
        let test_rule_start = makefile.find("${TESTDIR}/tests/test_main.o:").unwrap();
        let test_rule = &makefile[test_rule_start..makefile[test_rule_start..]
            .find("\n\n")
            .map(|i| test_rule_start + i)
            .unwrap_or(makefile.len())];
        assert!(!test_rule.contains("-Dmain=__nomain"));
    }

    #[test]
    fn dependency_checking_include_is_gated_on_the_setting() {
        let _lock = crate::tests::EnvLock::new();
        let mut descriptor = descriptor(&["a.c"]);
        let manager = manager();
        let generator = MakefileGenerator::new(&descriptor, &manager);
        let makefile = generator.conf_makefile(&descriptor.confs[0]);
        assert!(makefile.contains("include .dep.inc"));

        descriptor.confs[0].dependency_checking.set_value(false);
        let generator = MakefileGenerator::new(&descriptor, &manager);
        let makefile = generator.conf_makefile(&descriptor.confs[0]);
        assert!(!makefile.contains("include .dep.inc"));
    }

    #[test]
    fn impl_makefile_substitutes_project_and_configurations() {
        let _lock = crate::tests::EnvLock::new();
        let mut descriptor = descriptor(&["a.c"]);
        descriptor.confs.push(MakeConfiguration::new(
            "Release",
            ConfigurationType::Application,
        ));
        let manager = manager();
        let generator = MakefileGenerator::new(&descriptor, &manager);
        let makefile = generator.impl_makefile();
        assert!(makefile.contains("PROJECTNAME=app"));
        assert!(makefile.contains("ALLCONFS=Debug Release"));
        assert!(makefile.contains("DEFAULTCONF=Debug"));
        assert!(!makefile.contains("<PN>"));
        assert!(!makefile.contains("<CNS>"));
        assert!(!makefile.contains("<CN>"));
        // The dependency-check recipe writes a commented header into .dep.inc.
        assert!(makefile.contains(".depcheck-impl:"));
        assert!(makefile.contains("@echo \"# This code depends on make tool being used\" >.dep.inc"));
    }

    #[test]
    fn foreign_variables_are_preserved_across_regeneration() {
        let _lock = crate::tests::EnvLock::new();
        let descriptor = descriptor(&["a.c"]);
        let manager = manager();
        let generator = MakefileGenerator::new(&descriptor, &manager);
        let first = generator.variables_makefile(None);
        let edited = format!("{}MY_EXTRA_FLAG=-funroll-loops\n", first);
        let second = generator.variables_makefile(Some(&edited));
        assert!(second.contains("MY_EXTRA_FLAG=-funroll-loops"));
        assert!(second.contains("CND_PLATFORM_Debug="));
        // Regenerating without edits is stable.
        assert_eq!(first, generator.variables_makefile(Some(&first)));
    }

    #[test]
    fn generation_is_idempotent_on_disk() {
        let _lock = crate::tests::EnvLock::new();
        let dir = TempDir::new("generator").unwrap();
        let mut descriptor = descriptor(&["a.c", "b.cpp"]);
        descriptor.base_dir = dir.path().to_path_buf();
        let manager = manager();
        let generator = MakefileGenerator::new(&descriptor, &manager);

        let written = generator.generate().unwrap();
        let first: Vec<String> = written
            .iter()
            .map(|p| utility::read_file(p).unwrap())
            .collect();
        generator.generate().unwrap();
        for (path, before) in written.iter().zip(first) {
            assert_eq!(utility::read_file(path).unwrap(), before, "{:?}", path);
        }
    }
}

static IMPL_TEMPLATE: &str = r##"#
# Generated Makefile - do not edit!
#
# Edit the Makefile in the project folder instead (../Makefile). Each target
# has a pre- and a post- target defined where you can add customization code.
#
# This makefile implements macros and targets common to all configurations.
#
# NOCDDL


# Building and Cleaning subprojects are done by default, but can be controlled
# with the SUB macro. If SUB=no, subprojects will not be built or cleaned.
SUB_no=NO
SUBPROJECTS=${SUB_${SUB}}
BUILD_SUBPROJECTS_=.build-subprojects
BUILD_SUBPROJECTS_NO=
BUILD_SUBPROJECTS=${BUILD_SUBPROJECTS_${SUBPROJECTS}}
CLEAN_SUBPROJECTS_=.clean-subprojects
CLEAN_SUBPROJECTS_NO=
CLEAN_SUBPROJECTS=${CLEAN_SUBPROJECTS_${SUBPROJECTS}}


# Project Name
PROJECTNAME=<PN>

# Active Configuration
DEFAULTCONF=<CN>
CONF=${DEFAULTCONF}

# All Configurations
ALLCONFS=<CNS>


# build
.build-impl: .validate-impl
	@#echo "=> Running $@... Configuration=$(CONF)"
	"${MAKE}" -f nbproject/Makefile-${CONF}.mk SUBPROJECTS=${SUBPROJECTS} .build-conf


# clean
.clean-impl: .validate-impl
	@#echo "=> Running $@... Configuration=$(CONF)"
	"${MAKE}" -f nbproject/Makefile-${CONF}.mk SUBPROJECTS=${SUBPROJECTS} .clean-conf


# clobber
.clobber-impl:
	@#echo "=> Running $@..."
	for CONF in ${ALLCONFS}; \
	do \
	    "${MAKE}" -f nbproject/Makefile-$${CONF}.mk SUBPROJECTS=${SUBPROJECTS} .clean-conf; \
	done


# all
.all-impl:
	@#echo "=> Running $@..."
	for CONF in ${ALLCONFS}; \
	do \
	    "${MAKE}" -f nbproject/Makefile-$${CONF}.mk SUBPROJECTS=${SUBPROJECTS} .build-conf; \
	done


# build tests
.build-tests-impl: .build-impl
	@#echo "=> Running $@... Configuration=$(CONF)"
	"${MAKE}" -f nbproject/Makefile-${CONF}.mk SUBPROJECTS=${SUBPROJECTS} .build-tests-conf


# run tests
.test-impl: .build-tests-impl
	@#echo "=> Running $@... Configuration=$(CONF)"
	"${MAKE}" -f nbproject/Makefile-${CONF}.mk SUBPROJECTS=${SUBPROJECTS} .test-conf


# dependency checking support
.depcheck-impl:
	@echo "# This code depends on make tool being used" >.dep.inc
	@if [ -n "${MAKE_VERSION}" ]; then \
	    echo "DEPFILES=\$$(wildcard \$$(addsuffix .d, \$${OBJECTFILES}))" >>.dep.inc; \
	    echo "ifneq (\$${DEPFILES},)" >>.dep.inc; \
	    echo "include \$${DEPFILES}" >>.dep.inc; \
	    echo "endif" >>.dep.inc; \
	else \
	    echo ".KEEP_STATE:" >>.dep.inc; \
	    echo ".KEEP_STATE_FILE:.make.state.\$${CONF}" >>.dep.inc; \
	fi


# configuration validation
.validate-impl:
	@if [ ! -f nbproject/Makefile-${CONF}.mk ]; \
	then \
	    echo ""; \
	    echo "Error: can not find the makefile for configuration '${CONF}' in project <PN>"; \
	    echo "See 'make help' for details."; \
	    echo "Current directory: " `pwd`; \
	    echo ""; \
	    exit 1; \
	fi


# help
.help-impl: .help-pre
	@echo "This makefile supports the following configurations:"
	@echo "    <CNS>"
	@echo ""
	@echo "and the following targets:"
	@echo "    build  (default target)"
	@echo "    clean"
	@echo "    clobber"
	@echo "    all"
	@echo "    build-tests"
	@echo "    test"
	@echo "    help"
	@echo ""
	@echo "Makefile Usage:"
	@echo "    make [CONF=<CONFIGURATION>] build"
	@echo "    make [CONF=<CONFIGURATION>] clean"
	@echo "    make clobber"
	@echo "    make all"
	@echo "    make [CONF=<CONFIGURATION>] build-tests"
	@echo "    make [CONF=<CONFIGURATION>] test"
	@echo "    make help"
"##;
