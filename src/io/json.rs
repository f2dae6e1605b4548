//! JSON (de)serialization to and from files.
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Error;

/// Serialize `value` into `path`, creating missing parent directories.
///
/// An existing file is overwritten.
pub fn save<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    debug!("writing {:?}", path);
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Deserialize the content of `path`.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    debug!("reading {:?}", path);
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("map.json");

        let mut map: HashMap<u32, Vec<String>> = HashMap::new();
        map.insert(0, vec!["Physics".to_string()]);
        map.insert(12, vec![]);

        save(&map, &path).unwrap();
        let loaded: HashMap<u32, Vec<String>> = load(&path).unwrap();
        assert_eq!(loaded, map);
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: Result<Vec<String>, Error> = load(&dir.path().join("nope.json"));
        assert!(matches!(loaded, Err(Error::Io(_))));
    }
}
