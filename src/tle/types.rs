/// Three-line element set as published by the remote source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSet {
    pub name: String,
    pub line1: String,
    pub line2: String,
}
