/*!
 * Completion result
 *
 * Candidates are kept whole; the editor only inserts what follows the prefix
 * the user already typed.
 */

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Completion {
    /// Matching candidates, deduplicated and sorted.
    pub candidates: Vec<String>,
    /// Length, in characters, of the prefix being completed.
    pub replace_len: usize,
}

impl Completion {
    pub fn new(candidates: Vec<String>, replace_len: usize) -> Self {
        Self {
            candidates,
            replace_len,
        }
    }

    /// Text to insert after the cursor for each candidate.
    pub fn suffixes(&self) -> Vec<String> {
        self.candidates
            .iter()
            .map(|c| c.chars().skip(self.replace_len).collect())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_drops_typed_prefix() {
        let completion = Completion::new(vec!["users".into(), "USE".into()], 2);
        assert_eq!(completion.suffixes(), vec!["ers", "E"]);
    }

    #[test]
    fn empty_prefix_inserts_whole_candidate() {
        let completion = Completion::new(vec!["orders".into()], 0);
        assert_eq!(completion.suffixes(), vec!["orders"]);
    }
}
