/// # TranslationRequest
///
/// An ordered batch of token sequences, one per source item.
///
/// Conversions copy the caller's tokens into owned storage up front, so the
/// request never borrows caller memory once a dispatch has started. An absent
/// batch (`None`) converts to an empty request, and an empty request is a
/// valid "nothing to do" that never reaches the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationRequest {
    items: Vec<Vec<String>>,
}

impl TranslationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Vec<String>] {
        &self.items
    }

    /// Hands the owned batch over to the engine.
    pub(crate) fn into_batch(self) -> Vec<Vec<String>> {
        self.items
    }
}

impl<I, S> FromIterator<I> for TranslationRequest
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self {
            items: iter
                .into_iter()
                .map(|sequence| sequence.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}

impl<S: Into<String>> From<Vec<Vec<S>>> for TranslationRequest {
    fn from(items: Vec<Vec<S>>) -> Self {
        items.into_iter().collect()
    }
}

impl<S: Into<String> + Clone> From<&[Vec<S>]> for TranslationRequest {
    fn from(items: &[Vec<S>]) -> Self {
        items.iter().cloned().collect()
    }
}

impl<T: Into<TranslationRequest>> From<Option<T>> for TranslationRequest {
    fn from(items: Option<T>) -> Self {
        items.map(Into::into).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_nested_str_vectors() {
        let request = TranslationRequest::from(vec![vec!["a", "b"], vec!["c"]]);
        assert_eq!(request.len(), 2);
        assert_eq!(request.items()[0], vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_none_is_an_empty_request() {
        let request = TranslationRequest::from(None::<Vec<Vec<String>>>);
        assert!(request.is_empty());
        assert_eq!(request, TranslationRequest::from(Vec::<Vec<String>>::new()));
    }

    #[test]
    fn test_from_borrowed_slice_copies() {
        let owned = vec![vec!["x".to_string()]];
        let request = TranslationRequest::from(owned.as_slice());
        drop(owned);
        assert_eq!(request.into_batch(), vec![vec!["x".to_string()]]);
    }

    #[test]
    fn test_collect_from_whitespace_lines() {
        let request: TranslationRequest = ["hello world", "bye"]
            .iter()
            .map(|line| line.split_whitespace())
            .collect();
        assert_eq!(request.items()[0], vec!["hello".to_string(), "world".to_string()]);
        assert_eq!(request.items()[1], vec!["bye".to_string()]);
    }
}
