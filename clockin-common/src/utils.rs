use std::path::PathBuf;

#[cfg(not(target_os = "windows"))]
pub fn home_dir() -> PathBuf {
    std::env::var("HOME").map_or_else(|_| PathBuf::from("."), PathBuf::from)
}

#[cfg(target_os = "windows")]
pub fn home_dir() -> PathBuf {
    std::env::var("USERPROFILE").map_or_else(|_| PathBuf::from("."), PathBuf::from)
}

pub fn config_dir() -> PathBuf {
    let config_dir =
        std::env::var("XDG_CONFIG_HOME").map_or_else(|_| home_dir().join(".config"), PathBuf::from);
    config_dir.join("clockin")
}

pub fn data_dir() -> PathBuf {
    let data_dir = std::env::var("XDG_DATA_HOME")
        .map_or_else(|_| home_dir().join(".local").join("share"), PathBuf::from);
    data_dir.join("clockin")
}
