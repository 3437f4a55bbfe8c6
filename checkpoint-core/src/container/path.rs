use std::fmt;

/// `/`-separated location of a node, relative to the container root
///
/// Empty segments are dropped, so `""`, `"/"` and `"//"` all name the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(Self::parse(name).segments);
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment; `None` for the root
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Remainder of `self` below `prefix`, if `prefix` is an ancestor or equal
    pub fn strip_prefix(&self, prefix: &NodePath) -> Option<Self> {
        if self.segments.starts_with(&prefix.segments) {
            Some(Self {
                segments: self.segments[prefix.segments.len()..].to_vec(),
            })
        } else {
            None
        }
    }

    /// `self` followed by all segments of `other`
    pub fn join(&self, other: &NodePath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        f.write_str(&self.segments.join("/"))
    }
}

impl From<&str> for NodePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = NodePath::parse("/Simulation 1//20200315/Population");
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.to_string(), "Simulation 1/20200315/Population");
        assert_eq!(path.name(), Some("Population"));
        assert_eq!(NodePath::parse("").to_string(), "/");
    }

    #[test]
    fn test_parent_and_child() {
        let config = NodePath::root().child("Config");
        let blob = config.child("disease");
        assert_eq!(blob.parent(), Some(config.clone()));
        assert_eq!(config.parent(), Some(NodePath::root()));
        assert_eq!(NodePath::root().parent(), None);
    }

    #[test]
    fn test_strip_prefix_and_join() {
        let run = NodePath::parse("Simulation 0");
        let table = NodePath::parse("Simulation 0/20200101/Work");

        let relative = table.strip_prefix(&run).unwrap();
        assert_eq!(relative.to_string(), "20200101/Work");
        assert_eq!(NodePath::root().join(&relative), relative);
        assert!(run.strip_prefix(&table).is_none());
    }
}
