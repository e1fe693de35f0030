//! Packaging-script generation. Each configuration with a real packaging
//! setup gets an executable `nbproject/Package-<conf>.bash` that stages the
//! artifact and the configured extra files into a scratch directory and
//! hands the staged tree to the selected packager.

use std::path::PathBuf;

use indoc::formatdoc;

use crate::config::tools::PACKAGING_TYPES;
use crate::config::{ConfigurationDescriptor, MakeConfiguration};
use crate::errors::{GeneratorError, PackagingError};
use crate::generator::{makefile, DIST_DIR};
use crate::utility;

/// How one package format turns the staged tree into a package. The command
/// runs inside the staging directory; `${TOP}` points back at the project.
pub struct Packager {
    pub name: &'static str,
    pub extension: &'static str,
    pub default_tool: &'static str,
    build_command: fn(tool: &str, verbose: bool, output: &str) -> String,
}

static PACKAGERS: &[Packager] = &[
    Packager {
        name: "Tar",
        extension: "tar",
        default_tool: "tar",
        build_command: |tool, verbose, output| {
            format!(
                "{} -{}cf \"${{TOP}}/{}\" *",
                tool,
                if verbose { "v" } else { "" },
                output
            )
        },
    },
    Packager {
        name: "Zip",
        extension: "zip",
        default_tool: "zip",
        build_command: |tool, verbose, output| {
            format!(
                "{} {}-r \"${{TOP}}/{}\" *",
                tool,
                if verbose { "" } else { "-q " },
                output
            )
        },
    },
    Packager {
        name: "SVR4",
        extension: "pkg",
        default_tool: "pkgmk",
        build_command: |tool, _verbose, output| {
            format!(
                "{} -o -d . -f \"${{TOP}}/nbproject/prototype\" && pkgtrans -s . \"${{TOP}}/{}\" `ls`",
                tool, output
            )
        },
    },
    Packager {
        name: "RPM",
        extension: "rpm",
        default_tool: "rpmbuild",
        build_command: |tool, verbose, output| {
            format!(
                "{} -bb {}--buildroot `pwd` \"${{TOP}}/nbproject/package.spec\" && cp RPMS/*/*.rpm \"${{TOP}}/{}\"",
                tool,
                if verbose { "-v " } else { "" },
                output
            )
        },
    },
    Packager {
        name: "Debian",
        extension: "deb",
        default_tool: "dpkg-deb",
        build_command: |tool, _verbose, output| {
            format!("{} --build . \"${{TOP}}/{}\"", tool, output)
        },
    },
];

/// Looks a packager up by its type name from the packaging configuration.
pub fn find_packager(name: &str) -> Result<&'static Packager, PackagingError> {
    PACKAGERS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| PackagingError::UnknownPackager(name.to_string()))
}

/// The package file name for a configuration, derived from the explicit
/// output path when set, otherwise from the project name and the packager's
/// extension.
pub fn package_name(descriptor: &ConfigurationDescriptor, conf: &MakeConfiguration) -> String {
    if conf.packaging.output.modified() {
        let output = conf.packaging.output.value();
        return match output.rsplit_once('/') {
            Some((_, name)) => name.to_string(),
            None => output.to_string(),
        };
    }
    let extension = find_packager(conf.packaging.packaging_type.name())
        .map(|p| p.extension)
        .unwrap_or("tar");
    format!("{}.{}", descriptor.project_name(), extension)
}

/// Writes the packaging script for a configuration, or `None` when the
/// configuration has nothing to package (the dummy type with no file list).
pub fn generate_script(
    descriptor: &ConfigurationDescriptor,
    conf: &MakeConfiguration,
) -> Result<Option<PathBuf>, GeneratorError> {
    if conf.packaging.is_dummy() && conf.packaging.files.is_empty() {
        return Ok(None);
    }
    let script = render_script(descriptor, conf)?;
    let path = descriptor
        .base_dir
        .join("nbproject")
        .join(format!("Package-{}.bash", conf.name));
    utility::write_file(&path, &script)?;
    utility::make_executable(&path)?;
    Ok(Some(path))
}

fn render_script(
    descriptor: &ConfigurationDescriptor,
    conf: &MakeConfiguration,
) -> Result<String, PackagingError> {
    let packaging = &conf.packaging;
    let packager = find_packager(if packaging.is_dummy() {
        PACKAGING_TYPES[0]
    } else {
        packaging.packaging_type.name()
    })?;
    let tool = if packaging.tool.modified() {
        packaging.tool.value().to_string()
    } else {
        packager.default_tool.to_string()
    };
    let package = package_name(descriptor, conf);
    let package_dir = format!("{}/{}/package", DIST_DIR, conf.name);
    let package_path = format!("{}/{}", package_dir, package);
    let artifact_path = makefile::artifact_path(descriptor, conf);
    let artifact_name = match artifact_path.rsplit_once('/') {
        Some((_, name)) => name.to_string(),
        None => artifact_path.clone(),
    };
    let top_dir = if packaging.top_directory.modified() {
        packaging.top_directory.value().to_string()
    } else {
        descriptor.project_name()
    };

    let mut script = formatdoc!(
        r#"
        #!/bin/bash -x

        #
        # Generated - do not edit!
        #

        # Macros
        TOP=`pwd`
        CND_CONF={conf}
        CND_DISTDIR={dist}
        CND_BUILDDIR={build}
        NBTMPDIR=${{CND_BUILDDIR}}/${{CND_CONF}}/tmp-packaging
        OUTPUT_PATH={output_path}
        OUTPUT_BASENAME={output_basename}
        PACKAGE_TOP_DIR={top_dir}/

        # Functions
        function checkReturnCode
        {{
            rc=$?
            if [ $rc != 0 ]
            then
                exit $rc
            fi
        }}
        function makeDirectory
        # $1 directory path
        # $2 permission (optional)
        {{
            mkdir -p "$1"
            checkReturnCode
            if [ "$2" != "" ]
            then
                chmod $2 "$1"
                checkReturnCode
            fi
        }}
        function copyFileToTmpDir
        # $1 from-file path
        # $2 to-file path
        # $3 permission
        {{
            cp "$1" "$2"
            checkReturnCode
            if [ "$3" != "" ]
            then
                chmod $3 "$2"
                checkReturnCode
            fi
        }}

        # Setup
        cd "${{TOP}}"
        mkdir -p {package_dir}
        rm -rf ${{NBTMPDIR}}
        mkdir -p ${{NBTMPDIR}}

        # Copy files and create directories and links
        cd "${{TOP}}"
        "#,
        conf = conf.name,
        dist = DIST_DIR,
        build = crate::generator::BUILD_DIR,
        output_path = artifact_path,
        output_basename = artifact_name,
        top_dir = top_dir,
        package_dir = package_dir,
    );

    if packaging.files.is_empty() {
        // No explicit file list: stage the artifact under <top>/bin.
        script.push_str(&formatdoc!(
            r#"
            makeDirectory "${{NBTMPDIR}}/${{PACKAGE_TOP_DIR}}bin"
            copyFileToTmpDir "${{OUTPUT_PATH}}" "${{NBTMPDIR}}/${{PACKAGE_TOP_DIR}}bin/${{OUTPUT_BASENAME}}" 0755

            "#
        ));
    } else {
        for file in &packaging.files {
            let to = file.to.replace("${OUTPUT_BASENAME}", &artifact_name);
            match file.file_kind {
                1 => script.push_str(&format!(
                    "makeDirectory \"${{NBTMPDIR}}/{}\" {}\n",
                    to, file.permission
                )),
                2 => script.push_str(&format!(
                    "ln -sf \"{}\" \"${{NBTMPDIR}}/{}\"\ncheckReturnCode\n",
                    file.from, to
                )),
                _ => {
                    if let Some((dir, _)) = to.rsplit_once('/') {
                        script.push_str(&format!("makeDirectory \"${{NBTMPDIR}}/{}\"\n", dir));
                    }
                    script.push_str(&format!(
                        "copyFileToTmpDir \"{}\" \"${{NBTMPDIR}}/{}\" {}\n",
                        file.from, to, file.permission
                    ));
                }
            }
        }
        script.push('\n');
    }

    let build_command = (packager.build_command)(&tool, packaging.verbose.value(), &package_path);
    script.push_str(&formatdoc!(
        r#"
        # Create the package
        cd "${{TOP}}"
        rm -f {package_path}
        cd ${{NBTMPDIR}}
        {build_command}
        checkReturnCode

        # Cleanup
        cd "${{TOP}}"
        rm -rf ${{NBTMPDIR}}
        "#,
        package_path = package_path,
        build_command = build_command,
    ));
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use tempdir::TempDir;

    use crate::config::tools::PackagingFile;
    use crate::config::ConfigurationType;

    fn descriptor_with_conf(packaging_type: usize) -> ConfigurationDescriptor {
        let mut descriptor = ConfigurationDescriptor::new(Path::new("/tmp/app"));
        let mut conf = MakeConfiguration::new("Release", ConfigurationType::Application);
        conf.packaging.packaging_type.set_value(packaging_type);
        descriptor.confs.push(conf);
        descriptor
    }

    #[test]
    fn every_declared_package_type_has_a_packager() {
        for name in &PACKAGING_TYPES[..PACKAGING_TYPES.len() - 1] {
            assert!(find_packager(name).is_ok(), "{}", name);
        }
        assert!(matches!(
            find_packager("Snap"),
            Err(PackagingError::UnknownPackager(_))
        ));
    }

    #[test]
    fn dummy_packaging_without_files_is_skipped() {
        let descriptor = descriptor_with_conf(crate::config::tools::PACKAGING_TYPE_DUMMY);
        let result = generate_script(&descriptor, &descriptor.confs[0]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn script_carries_the_helper_preamble_and_tar_command() {
        let descriptor = descriptor_with_conf(0);
        let script = render_script(&descriptor, &descriptor.confs[0]).unwrap();
        assert!(script.starts_with("#!/bin/bash -x"));
        assert!(script.contains("function checkReturnCode"));
        assert!(script.contains("function makeDirectory"));
        assert!(script.contains("function copyFileToTmpDir"));
        assert!(script.contains("tar -vcf \"${TOP}/dist/Release/package/app.tar\" *"));
    }

    #[test]
    fn explicit_file_list_replaces_the_default_staging() {
        let mut descriptor = descriptor_with_conf(0);
        descriptor.confs[0].packaging.files.push(PackagingFile {
            file_kind: 0,
            to: "app/etc/app.conf".to_string(),
            from: "etc/app.conf".to_string(),
            permission: "0644".to_string(),
            owner: "root".to_string(),
            group: "root".to_string(),
        });
        descriptor.confs[0].packaging.files.push(PackagingFile {
            file_kind: 1,
            to: "app/var".to_string(),
            from: String::new(),
            permission: "0755".to_string(),
            owner: String::new(),
            group: String::new(),
        });
        let script = render_script(&descriptor, &descriptor.confs[0]).unwrap();
        assert!(script.contains(
            "copyFileToTmpDir \"etc/app.conf\" \"${NBTMPDIR}/app/etc/app.conf\" 0644"
        ));
        assert!(script.contains("makeDirectory \"${NBTMPDIR}/app/var\" 0755"));
        assert!(!script.contains("${PACKAGE_TOP_DIR}bin/${OUTPUT_BASENAME}"));
    }

    #[test]
    fn package_name_prefers_the_configured_output() {
        let mut descriptor = descriptor_with_conf(1);
        assert_eq!(
            package_name(&descriptor, &descriptor.confs[0]),
            "app.zip"
        );
        descriptor.confs[0]
            .packaging
            .output
            .set_value("dist/bundle-1.2.zip");
        assert_eq!(
            package_name(&descriptor, &descriptor.confs[0]),
            "bundle-1.2.zip"
        );
    }

    #[test]
    fn generated_script_is_executable() {
        let dir = TempDir::new("packaging").unwrap();
        let mut descriptor = descriptor_with_conf(0);
        descriptor.base_dir = dir.path().to_path_buf();
        let path = generate_script(&descriptor, &descriptor.confs[0])
            .unwrap()
            .unwrap();
        assert!(path.ends_with("nbproject/Package-Release.bash"));
        let script = utility::read_file(&path).unwrap();
        assert!(script.contains("# Generated - do not edit!"));
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_ne!(mode & 0o111, 0);
        }
    }
}
