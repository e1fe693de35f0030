use crate::errors::FsError;

pub fn create_dir(dir: &std::path::Path) -> Result<(), FsError> {
    std::fs::create_dir_all(dir).map_err(|err| FsError::CreateDirectory(dir.to_path_buf(), err))
}

pub fn create_file(path: &std::path::Path) -> Result<std::fs::File, FsError> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    std::fs::File::create(path).map_err(|err| FsError::CreateFile(path.to_path_buf(), err))
}

pub fn read_file(path: &std::path::Path) -> Result<String, FsError> {
    std::fs::read_to_string(path).map_err(|err| FsError::ReadFromFile(path.to_path_buf(), err))
}

pub fn write_file(path: &std::path::Path, data: &str) -> Result<(), FsError> {
    use std::io::Write;
    let mut file = create_file(path)?;
    file.write_all(data.as_bytes()).map_err(FsError::WriteToFile)
}

/// Mark a generated script executable. No-op outside unix.
#[cfg(unix)]
pub fn make_executable(path: &std::path::Path) -> Result<(), FsError> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = std::fs::metadata(path)
        .map_err(|err| FsError::ReadFromFile(path.to_path_buf(), err))?;
    let mut permissions = metadata.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    std::fs::set_permissions(path, permissions)
        .map_err(|err| FsError::SetPermissions(path.to_path_buf(), err))
}

#[cfg(not(unix))]
pub fn make_executable(_path: &std::path::Path) -> Result<(), FsError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn write_file_creates_missing_parent_directories() {
        let dir = TempDir::new("utility").unwrap();
        let path = dir.path().join("nbproject").join("private").join("f.txt");
        write_file(&path, "content").unwrap();
        assert_eq!(read_file(&path).unwrap(), "content");
    }
}
