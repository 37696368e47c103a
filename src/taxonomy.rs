//! PlantVillage label taxonomy
//!
//! The position of a label in the taxonomy is its canonical class index and
//! must match the order of the model's output vector. The taxonomy is built
//! once at startup and then only ever handed out by shared reference.

use std::fs;
use std::path::Path;

use crate::utils::error::{PlantVillageError, Result, ResultExt};

/// Number of classes the bundled model was trained on
pub const NUM_CLASSES: usize = 38;

/// Class names in model output order.
/// Format: "Plant___Disease" or "Plant___healthy"
pub const CLASS_NAMES: [&str; NUM_CLASSES] = [
    "Apple___Apple_scab",                            // 0
    "Apple___Black_rot",                             // 1
    "Apple___Cedar_apple_rust",                      // 2
    "Apple___healthy",                               // 3
    "Blueberry___healthy",                           // 4
    "Cherry___Powdery_mildew",                       // 5
    "Cherry___healthy",                              // 6
    "Corn___Cercospora_leaf_spot Gray_leaf_spot",    // 7
    "Corn___Common_rust",                            // 8
    "Corn___Northern_Leaf_Blight",                   // 9
    "Corn___healthy",                                // 10
    "Grape___Black_rot",                             // 11
    "Grape___Esca Black_Measles",                    // 12
    "Grape___Leaf_blight Isariopsis_Leaf_Spot",      // 13
    "Grape___healthy",                               // 14
    "Orange___Haunglongbing_(Citrus_greening)",      // 15
    "Peach___Bacterial_spot",                        // 16
    "Peach___healthy",                               // 17
    "Pepper,_bell___Bacterial_spot",                 // 18
    "Pepper,_bell___healthy",                        // 19
    "Potato___Early_blight",                         // 20
    "Potato___Late_blight",                          // 21
    "Potato___healthy",                              // 22
    "Raspberry___healthy",                           // 23
    "Soybean___healthy",                             // 24
    "Squash___Powdery_mildew",                       // 25
    "Strawberry___Leaf_scorch",                      // 26
    "Strawberry___healthy",                          // 27
    "Tomato___Bacterial_spot",                       // 28
    "Tomato___Early_blight",                         // 29
    "Tomato___Late_blight",                          // 30
    "Tomato___Leaf_Mold",                            // 31
    "Tomato___Septoria_leaf_spot",                   // 32
    "Tomato___Spider_mites Two-spotted_spider_mite", // 33
    "Tomato___Target_Spot",                          // 34
    "Tomato___Tomato_Yellow_Leaf_Curl_Virus",        // 35
    "Tomato___Tomato_mosaic_virus",                  // 36
    "Tomato___healthy",                              // 37
];

/// Ordered, immutable sequence of class labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    labels: Vec<String>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::plantvillage()
    }
}

impl Taxonomy {
    /// The 38-class PlantVillage taxonomy the bundled model was trained with
    pub fn plantvillage() -> Self {
        Self {
            labels: CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Build a taxonomy from an explicit label list
    pub fn from_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(PlantVillageError::Config(
                "Label taxonomy must contain at least one class".to_string(),
            ));
        }
        Ok(Self { labels })
    }

    /// Load a newline-separated labels file; blank lines are ignored
    pub fn from_labels_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read labels file {}", path.display()))?;

        Self::from_labels(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Get the class name for a given label index
    pub fn class_name(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Get the label index for a given class name
    pub fn class_index(&self, name: &str) -> Option<usize> {
        self.labels.iter().position(|n| n == name)
    }

    /// Check if a class represents a healthy plant (not diseased)
    pub fn is_healthy(&self, index: usize) -> bool {
        self.class_name(index)
            .map(|name| name.ends_with("healthy"))
            .unwrap_or(false)
    }

    /// Get the plant name from a class (e.g., "Tomato" from "Tomato___Bacterial_spot")
    pub fn plant_name(&self, index: usize) -> Option<&str> {
        self.class_name(index)
            .and_then(|name| name.split("___").next())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_plantvillage_size() {
        let taxonomy = Taxonomy::plantvillage();
        assert_eq!(taxonomy.len(), 38);
        assert_eq!(taxonomy.iter().count(), NUM_CLASSES);
    }

    #[test]
    fn test_class_name() {
        let taxonomy = Taxonomy::default();
        assert_eq!(taxonomy.class_name(0), Some("Apple___Apple_scab"));
        assert_eq!(taxonomy.class_name(3), Some("Apple___healthy"));
        assert_eq!(taxonomy.class_name(37), Some("Tomato___healthy"));
        assert_eq!(taxonomy.class_name(38), None);
    }

    #[test]
    fn test_class_index() {
        let taxonomy = Taxonomy::default();
        assert_eq!(taxonomy.class_index("Apple___Apple_scab"), Some(0));
        assert_eq!(taxonomy.class_index("Tomato___healthy"), Some(37));
        assert_eq!(taxonomy.class_index("Unknown___class"), None);
    }

    #[test]
    fn test_is_healthy() {
        let taxonomy = Taxonomy::default();
        assert!(!taxonomy.is_healthy(0)); // Apple___Apple_scab
        assert!(taxonomy.is_healthy(3)); // Apple___healthy
        assert!(taxonomy.is_healthy(37)); // Tomato___healthy
        assert!(!taxonomy.is_healthy(99));
    }

    #[test]
    fn test_plant_name() {
        let taxonomy = Taxonomy::default();
        assert_eq!(taxonomy.plant_name(0), Some("Apple"));
        assert_eq!(taxonomy.plant_name(18), Some("Pepper,_bell"));
        assert_eq!(taxonomy.plant_name(28), Some("Tomato"));
    }

    #[test]
    fn test_empty_labels_rejected() {
        let result = Taxonomy::from_labels(Vec::<String>::new());
        assert!(matches!(result, Err(PlantVillageError::Config(_))));
    }

    #[test]
    fn test_labels_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("labels.txt");
        fs::write(&path, "Rose___healthy\n\n  Rose___Black_spot  \n").unwrap();

        let taxonomy = Taxonomy::from_labels_file(&path).unwrap();
        assert_eq!(taxonomy.len(), 2);
        assert_eq!(taxonomy.class_name(1), Some("Rose___Black_spot"));
    }

    #[test]
    fn test_labels_file_missing() {
        let result = Taxonomy::from_labels_file(Path::new("/nonexistent/labels.txt"));
        assert!(matches!(result, Err(PlantVillageError::Config(_))));
    }
}
