use std::fs;
use std::io;
use std::path::Path;

/// Checks if a file exists at the given path
pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists()
}

/// Read a whole file as UTF-8 text
pub fn read_file<P: AsRef<Path>>(path: P) -> io::Result<String> {
    fs::read_to_string(path)
}

/// Replace the contents of a file
pub fn write_file<P: AsRef<Path>>(path: P, content: &str) -> io::Result<()> {
    fs::write(path, content)
}

/// Absolute form of a path for messages, falls back to the path as given
pub fn display_path<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
