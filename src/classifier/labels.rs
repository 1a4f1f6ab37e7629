use std::borrow::Cow;
use std::fs;
use std::path::Path;

use log::info;

use super::error::ModelLoadError;

/// Class names indexed by the network's output position.
///
/// Indices past the end of the table resolve to a `Class_<index>` placeholder,
/// so a partial table degrades gracefully instead of failing a prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    names: Vec<String>,
}

impl LabelTable {
    pub fn new(names: Vec<impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Reads one label per line, in network output order.
    ///
    /// Lines in WordNet synset form (`n01440764 tench, Tinca tinca`) are reduced
    /// to their first readable name. Trailing blank lines are dropped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ModelLoadError::Labels {
            path: path.to_path_buf(),
            source,
        })?;

        let table = Self::parse(&contents);
        if table.is_empty() {
            return Err(ModelLoadError::EmptyLabels(path.to_path_buf()));
        }
        info!("Loaded {} labels from {:?}", table.len(), path);
        Ok(table)
    }

    /// Parses label file contents. See [`LabelTable::from_file`].
    pub fn parse(contents: &str) -> Self {
        let mut names: Vec<String> = contents.lines().map(clean_line).collect();
        while names.last().is_some_and(|name| name.is_empty()) {
            names.pop();
        }
        Self { names }
    }

    /// The 30-name ImageNet excerpt used when no label file is configured.
    pub fn imagenet_sample() -> Self {
        Self::new(IMAGENET_SAMPLE.to_vec())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Name for a class index, or the `Class_<index>` placeholder.
    pub fn name_for(&self, index: usize) -> Cow<'_, str> {
        match self.get(index) {
            Some(name) if !name.is_empty() => Cow::Borrowed(name),
            _ => Cow::Owned(placeholder_name(index)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

pub(crate) fn placeholder_name(index: usize) -> String {
    format!("Class_{}", index)
}

fn clean_line(line: &str) -> String {
    let line = line.trim();
    let line = match line.split_once(' ') {
        Some((id, rest)) if is_synset_id(id) => rest.split(',').next().unwrap_or(rest).trim(),
        _ => line,
    };
    line.to_string()
}

fn is_synset_id(token: &str) -> bool {
    token.len() == 9
        && token.starts_with('n')
        && token[1..].chars().all(|c| c.is_ascii_digit())
}

const IMAGENET_SAMPLE: [&str; 30] = [
    "tench", "goldfish", "great white shark", "tiger shark",
    "hammerhead", "electric ray", "stingray", "cock", "hen",
    "ostrich", "brambling", "goldfinch", "house finch",
    "junco", "indigo bunting", "robin", "bulbul", "jay",
    "magpie", "chickadee", "water ouzel", "kite", "bald eagle",
    "vulture", "great grey owl", "European fire salamander",
    "common newt", "eft", "spotted salamander", "axolotl",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_past_end() {
        let table = LabelTable::new(vec!["cat", "dog"]);
        assert_eq!(table.name_for(1), "dog");
        assert_eq!(table.name_for(2), "Class_2");
        assert_eq!(table.name_for(999), "Class_999");
    }

    #[test]
    fn test_parse_plain_and_synset_lines() {
        let table = LabelTable::parse("n01440764 tench, Tinca tinca\ngoldfish\n  tabby cat  \n\n\n");
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0), Some("tench"));
        assert_eq!(table.get(1), Some("goldfish"));
        assert_eq!(table.get(2), Some("tabby cat"));
    }

    #[test]
    fn test_interior_blank_line_keeps_ordering() {
        let table = LabelTable::parse("a\n\nc\n");
        assert_eq!(table.len(), 3);
        assert_eq!(table.name_for(1), "Class_1");
        assert_eq!(table.name_for(2), "c");
    }

    #[test]
    fn test_sample_table() {
        let table = LabelTable::imagenet_sample();
        assert_eq!(table.len(), 30);
        assert_eq!(table.get(0), Some("tench"));
        assert_eq!(table.get(29), Some("axolotl"));
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        assert!(matches!(
            LabelTable::from_file(&missing),
            Err(ModelLoadError::Labels { .. })
        ));

        let empty = dir.path().join("empty.txt");
        fs::write(&empty, "\n\n").unwrap();
        assert!(matches!(
            LabelTable::from_file(&empty),
            Err(ModelLoadError::EmptyLabels(_))
        ));
    }
}
