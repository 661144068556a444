use crate::dataset::ReferenceDataset;
use std::collections::{BTreeSet, HashMap};

/// Dense label → index mapping, indices assigned in ascending label order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryVocabulary {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl CategoryVocabulary {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let distinct: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
        let labels: Vec<String> = distinct.into_iter().collect();
        let index = labels
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.clone(), idx))
            .collect();
        Self { labels, index }
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Labels in index order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// The two independent vocabularies the model was trained with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabularies {
    pub region: CategoryVocabulary,
    pub crop: CategoryVocabulary,
}

impl Vocabularies {
    pub fn from_dataset(dataset: &ReferenceDataset) -> Self {
        Self {
            region: CategoryVocabulary::from_labels(dataset.regions.iter().cloned()),
            crop: CategoryVocabulary::from_labels(dataset.crops.iter().cloned()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_empty() && self.crop.is_empty()
    }
}
