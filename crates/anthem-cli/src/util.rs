use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anthem_features::record::RawSongRecord;
use anthem_mapper::{config::MapperConfig, feature_space::EntityDataset};
use anyhow::Context;

use crate::schema::graph_document::GraphDocument;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;
    Ok(value)
}

/// Read raw fight-song rows (a JSON array) from a file
pub fn read_songs_file<P>(path: P) -> anyhow::Result<Vec<RawSongRecord>>
where
    P: AsRef<Path>,
{
    read_json_file("songs", path)
}

/// Read an entity dataset produced by `prepare` or `generate`
pub fn read_entities_file<P>(path: P) -> anyhow::Result<EntityDataset>
where
    P: AsRef<Path>,
{
    read_json_file("entities", path)
}

pub fn read_config_file<P>(path: P) -> anyhow::Result<MapperConfig>
where
    P: AsRef<Path>,
{
    read_json_file("mapper config", path)
}

pub fn read_graph_file<P>(path: P) -> anyhow::Result<GraphDocument>
where
    P: AsRef<Path>,
{
    read_json_file("graph", path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_config_reads_back() {
        let path = std::env::temp_dir().join(format!("anthem-config-{}.json", std::process::id()));
        let config = MapperConfig {
            resolution: 7,
            ..MapperConfig::default()
        };
        Output::save_json(&config, Some(path.clone())).unwrap();
        let loaded = read_config_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_names_its_kind() {
        let err = read_entities_file("/nonexistent/anthem/entities.json").unwrap_err();
        assert!(err.to_string().contains("entities"));
    }
}
