//! End to end scenarios crossing the codec, the generator and toolchain
//! resolution, the way the command line drives them.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use tempdir::TempDir;

use makeproject::codec;
use makeproject::config::items::{Folder, FolderKind};
use makeproject::config::tools::CompilerKind;
use makeproject::config::{ConfigurationDescriptor, ConfigurationType, MakeConfiguration};
use makeproject::generator;
use makeproject::toolchain::descriptor::{builtin_catalog, ToolKind};
use makeproject::toolchain::discovery;
use makeproject::toolchain::manager::CompilerSetManager;
use makeproject::toolchain::{CompilerSet, Tool};
use makeproject::utility;

fn project(dir: &Path, items: &[&str]) -> ConfigurationDescriptor {
    let mut descriptor = ConfigurationDescriptor::new(dir);
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

fn gnu_manager() -> CompilerSetManager {
    let mut set = CompilerSet::new("GNU", "GNU", Path::new("/usr/bin"));
    set.tools
        .push(Tool::new(ToolKind::C, "gcc", Path::new("/usr/bin/gcc")));
    set.tools
        .push(Tool::new(ToolKind::Cpp, "g++", Path::new("/usr/bin/g++")));
    CompilerSetManager::from_sets("localhost", vec![set])
}

fn wrap(version: i32, body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <configurationDescriptor version=\"{}\">\n{}\n</configurationDescriptor>",
        version, body
    )
}

#[test]
fn modified_settings_survive_a_save_and_load_cycle() {
    let dir = TempDir::new("roundtrip").unwrap();
    let mut descriptor = project(dir.path(), &["a.c", "b.c"]);
    {
        let conf = &mut descriptor.confs[0];
        conf.c_compiler.include_directories.add("include");
        conf.c_compiler.preprocessor_definitions.add("TRACE");
        conf.item_configuration_mut(Rc::from("b.c"))
            .compiler_mut(CompilerKind::C)
            .important_flags
            .set_value("-fno-builtin");
        conf.item_configuration_mut(Rc::from("a.c"))
            .excluded
            .set_value(true);
    }
    codec::save(&descriptor).unwrap();

    let loaded = codec::load(dir.path()).unwrap();
    assert_eq!(loaded.version, codec::CURRENT_VERSION);
    assert!(!loaded.modified);
    assert_eq!(loaded.active, Some(0));
    let conf = &loaded.confs[0];
    assert_eq!(conf.c_compiler.include_directories.value(), &["include"]);
    assert_eq!(conf.c_compiler.preprocessor_definitions.value(), &["TRACE"]);
    // The excluded item was dropped from the stream and its exclusion is
    // re-derived from absence on load.
    assert!(conf.is_item_excluded("a.c"));
    assert!(!conf.is_item_excluded("b.c"));
    let item = conf.item_configurations.get("b.c").unwrap();
    assert_eq!(
        item.compiler(CompilerKind::C)
            .unwrap()
            .important_flags
            .value(),
        "-fno-builtin"
    );
}

#[test]
fn item_absence_means_included_before_the_inversion_and_excluded_after() {
    let body = "<logicalFolder name=\"root\" displayName=\"root\" projectFiles=\"true\">\n\
                  <itemPath>a.c</itemPath>\n\
                  <itemPath>b.c</itemPath>\n\
                </logicalFolder>\n\
                <confs>\n\
                  <conf name=\"Debug\" type=\"1\">\n\
                    <item path=\"a.c\" ex=\"false\" tool=\"1\"/>\n\
                  </conf>\n\
                </confs>";

    let old = codec::decode(&wrap(87, body), None, Path::new("/tmp/p"), None).unwrap();
    assert!(!old.confs[0].is_item_excluded("b.c"));

    let new = codec::decode(&wrap(88, body), None, Path::new("/tmp/p"), None).unwrap();
    assert!(new.confs[0].is_item_excluded("b.c"));
    assert!(!new.confs[0].is_item_excluded("a.c"));
}

#[test]
fn an_oldest_supported_document_is_lifted_to_current_semantics() {
    let body = "<logicalFolder name=\"root\" displayName=\"root\" projectFiles=\"true\">\n\
                  <itemPath>main.c</itemPath>\n\
                </logicalFolder>\n\
                <confs>\n\
                  <conf name=\"Default\" type=\"0\">\n\
                    <makefileType>\n\
                      <makeTool>\n\
                        <buildCommandWorkingDir>.</buildCommandWorkingDir>\n\
                        <buildCommand>make -f Makefile</buildCommand>\n\
                        <cleanCommand>make -f Makefile clean</cleanCommand>\n\
                      </makeTool>\n\
                    </makefileType>\n\
                    <compileType>\n\
                      <cTool>\n\
                        <incDir>\n\
                          <pElem>src</pElem>\n\
                          <pElem>config.h</pElem>\n\
                        </incDir>\n\
                      </cTool>\n\
                    </compileType>\n\
                  </conf>\n\
                </confs>";
    let descriptor = codec::decode(
        &wrap(codec::OLDEST_SUPPORTED_VERSION, body),
        None,
        Path::new("/tmp/p"),
        None,
    )
    .unwrap();

    let conf = &descriptor.confs[0];
    // Raw make invocations go through the ${MAKE} macro now.
    assert_eq!(conf.makefile.build_command.value(), "${MAKE} -f Makefile");
    assert_eq!(
        conf.makefile.clean_command.value(),
        "${MAKE} -f Makefile clean"
    );
    // Header entries moved from the include directories to the include files.
    assert_eq!(conf.c_compiler.include_directories.value(), &["src"]);
    assert_eq!(conf.c_compiler.include_files.value(), &["config.h"]);
    // Deprecated versions are flagged so the caller can offer a re-save.
    assert!(descriptor.modified);
}

#[test]
fn a_loaded_project_generates_the_full_harness() {
    let dir = TempDir::new("generate").unwrap();
    codec::save(&project(dir.path(), &["a.c", "b.cpp"])).unwrap();

    let loaded = codec::load(dir.path()).unwrap();
    let manager = gnu_manager();
    let written = generator::generate(&loaded, &manager).unwrap();

    let names: Vec<PathBuf> = written
        .iter()
        .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
        .collect();
    assert!(names.contains(&PathBuf::from("Makefile")));
    assert!(names.contains(&PathBuf::from("nbproject/Makefile-impl.mk")));
    assert!(names.contains(&PathBuf::from("nbproject/Makefile-variables.mk")));
    assert!(names.contains(&PathBuf::from("nbproject/Makefile-Debug.mk")));

    let conf_makefile =
        utility::read_file(&dir.path().join("nbproject/Makefile-Debug.mk")).unwrap();
    assert!(conf_makefile.contains("${OBJECTDIR}/a.o"));
    assert!(conf_makefile.contains("${OBJECTDIR}/b.o"));
    // One C++ source is enough to pull in the C++ link driver.
    assert!(conf_makefile.contains("${LINK.cc} -o"));
    assert!(conf_makefile.contains("CC=/usr/bin/gcc"));
    assert!(conf_makefile.contains("CXX=/usr/bin/g++"));
}

#[test]
fn regenerating_a_reloaded_project_is_byte_identical() {
    let dir = TempDir::new("stable").unwrap();
    codec::save(&project(dir.path(), &["src/main.c", "src/util.c"])).unwrap();
    let manager = gnu_manager();

    let written = generator::generate(&codec::load(dir.path()).unwrap(), &manager).unwrap();
    let before: Vec<String> = written
        .iter()
        .map(|p| utility::read_file(p).unwrap())
        .collect();
    generator::generate(&codec::load(dir.path()).unwrap(), &manager).unwrap();
    for (path, expected) in written.iter().zip(before) {
        assert_eq!(utility::read_file(path).unwrap(), expected, "{:?}", path);
    }
}

#[test]
fn user_edits_to_the_variables_file_survive_regeneration() {
    let dir = TempDir::new("variables").unwrap();
    codec::save(&project(dir.path(), &["a.c"])).unwrap();
    let manager = gnu_manager();
    generator::generate(&codec::load(dir.path()).unwrap(), &manager).unwrap();

    let variables_path = dir.path().join("nbproject/Makefile-variables.mk");
    let mut edited = utility::read_file(&variables_path).unwrap();
    edited.push_str("MY_LOCAL_FLAG=-funroll-loops\n");
    utility::write_file(&variables_path, &edited).unwrap();

    generator::generate(&codec::load(dir.path()).unwrap(), &manager).unwrap();
    let regenerated = utility::read_file(&variables_path).unwrap();
    assert!(regenerated.contains("MY_LOCAL_FLAG=-funroll-loops"));
    assert!(regenerated.contains("CND_PLATFORM_Debug="));
}

#[test]
fn test_folder_items_are_wired_into_the_harness_on_reload() {
    let dir = TempDir::new("testitems").unwrap();
    let mut descriptor = project(dir.path(), &["src/main.c"]);
    let mut tests_folder = Folder::new("tests", FolderKind::TestLogicalFolder);
    tests_folder.add_item(Rc::from("tests/test_main.c"));
    descriptor.logical_folders.folders.push(tests_folder);
    codec::save(&descriptor).unwrap();

    let manager = gnu_manager();
    generator::generate(&codec::load(dir.path()).unwrap(), &manager).unwrap();
    let conf_makefile =
        utility::read_file(&dir.path().join("nbproject/Makefile-Debug.mk")).unwrap();
    assert!(conf_makefile.contains("${TESTDIR}/tests/test_main.o"));
    assert!(conf_makefile.contains("${OBJECTDIR}/src/main_nomain.o"));
    // The test source never enters the main object list.
    assert!(!conf_makefile.contains("${OBJECTDIR}/tests/test_main.o"));
}

#[test]
fn remote_records_resolve_deferred_paths_through_search_directories() {
    let dir = TempDir::new("records").unwrap();
    utility::write_file(&dir.path().join("g++"), "").unwrap();

    let record =
        discovery::parse_record("GNU;/usr/bin;c=gcc;cxx=g++(PATH);version=11.4").unwrap();
    let set = discovery::resolve_record(&record, builtin_catalog(), &[dir.path().to_path_buf()]);
    assert_eq!(set.flavor, "GNU");
    let c = set.tool(ToolKind::C).unwrap();
    assert_eq!(c.path, PathBuf::from("/usr/bin/gcc"));
    assert_eq!(c.version.as_deref(), Some("11.4"));
    // The deferred binding was found on the search path, not in the
    // record's directory.
    let cxx = set.tool(ToolKind::Cpp).unwrap();
    assert_eq!(cxx.path, dir.path().join("g++"));
}

#[test]
fn only_configured_packaging_produces_a_script() {
    let dir = TempDir::new("package").unwrap();
    let mut descriptor = project(dir.path(), &["a.c"]);
    descriptor.confs[0].packaging.packaging_type.set_value(0);
    descriptor.confs.push(MakeConfiguration::new(
        "Release",
        ConfigurationType::Application,
    ));
    let manager = gnu_manager();

    let written = generator::generate(&descriptor, &manager).unwrap();
    let script = written
        .iter()
        .find(|p| p.ends_with("nbproject/Package-Debug.bash"))
        .expect("the tar-packaged configuration should get a script");
    let script = utility::read_file(script).unwrap();
    assert!(script.contains("function checkReturnCode"));
    assert!(script.contains("tar "));
    // The Release configuration kept the dummy packaging type.
    assert!(!written
        .iter()
        .any(|p| p.ends_with("nbproject/Package-Release.bash")));
}
