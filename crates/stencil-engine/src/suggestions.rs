//! Fuzzy "did you mean" suggestions for unknown filters, functions and tests
//!
//! Candidates are the names registered by the engine's extensions plus the
//! MiniJinja built-ins, matched by Levenshtein distance.

use crate::extension::ExtensionNames;

/// Maximum Levenshtein distance to consider for suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Built-in MiniJinja filters
pub const BUILTIN_FILTERS: &[&str] = &[
    "abs",
    "attr",
    "batch",
    "bool",
    "capitalize",
    "default",
    "dictsort",
    "escape",
    "first",
    "float",
    "groupby",
    "indent",
    "int",
    "items",
    "join",
    "last",
    "length",
    "list",
    "lower",
    "map",
    "max",
    "min",
    "reject",
    "rejectattr",
    "replace",
    "reverse",
    "round",
    "safe",
    "select",
    "selectattr",
    "slice",
    "sort",
    "split",
    "string",
    "sum",
    "title",
    "tojson",
    "trim",
    "unique",
    "upper",
    "urlencode",
];

/// Built-in MiniJinja global functions
pub const BUILTIN_FUNCTIONS: &[&str] = &["range", "dict", "debug", "namespace"];

/// Built-in MiniJinja tests
pub const BUILTIN_TESTS: &[&str] = &[
    "boolean",
    "defined",
    "divisibleby",
    "endingwith",
    "eq",
    "even",
    "false",
    "filter",
    "float",
    "ge",
    "gt",
    "in",
    "integer",
    "iterable",
    "le",
    "lower",
    "lt",
    "mapping",
    "ne",
    "none",
    "number",
    "odd",
    "safe",
    "sameas",
    "sequence",
    "startingwith",
    "string",
    "test",
    "true",
    "undefined",
    "upper",
];

/// Suggestion result with confidence scoring
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggested correction
    pub text: String,
    /// Levenshtein distance (lower = better match)
    pub distance: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionCategory {
    Filter,
    Function,
    Test,
}

impl SuggestionCategory {
    fn label(self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::Function => "function",
            Self::Test => "test",
        }
    }
}

/// Find closest matches from a list of candidates
pub fn find_closest_matches(input: &str, candidates: &[&str], max_results: usize) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = strsim::levenshtein(input, candidate);
            (distance <= MAX_SUGGESTION_DISTANCE && distance > 0).then(|| Suggestion {
                text: candidate.to_string(),
                distance,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.text.cmp(&b.text)));
    suggestions.dedup_by(|a, b| a.text == b.text);
    suggestions.truncate(max_results);
    suggestions
}

/// Candidate names for a category: registered extensions first, then built-ins
pub fn candidates<'a>(names: &'a ExtensionNames, category: SuggestionCategory) -> Vec<&'a str> {
    let (registered, builtin): (Vec<&str>, &[&str]) = match category {
        SuggestionCategory::Filter => (names.filters.clone(), BUILTIN_FILTERS),
        SuggestionCategory::Function => {
            let mut all = names.functions.clone();
            all.extend(names.operators.iter().copied());
            (all, BUILTIN_FUNCTIONS)
        }
        SuggestionCategory::Test => {
            let mut all = names.tests.clone();
            all.extend(names.operators.iter().copied());
            (all, BUILTIN_TESTS)
        }
    };

    registered.into_iter().chain(builtin.iter().copied()).collect()
}

/// Suggest a correction for an unknown name
pub fn suggest_unknown(
    name: &str,
    category: SuggestionCategory,
    names: &ExtensionNames,
) -> Option<String> {
    let candidates = candidates(names, category);
    let matches = find_closest_matches(name, &candidates, 3);

    if matches.is_empty() {
        let registered = match category {
            SuggestionCategory::Filter => &names.filters,
            SuggestionCategory::Function => &names.functions,
            SuggestionCategory::Test => &names.operators,
        };
        if registered.is_empty() {
            return None;
        }
        return Some(format!(
            "Unknown {} `{}`. Registered: {}",
            category.label(),
            name,
            registered.join(", ")
        ));
    }

    let suggestions: Vec<String> = matches.iter().map(|s| format!("`{}`", s.text)).collect();
    Some(format!("Did you mean {}?", suggestions.join(" or ")))
}

/// Pull the offending name out of a MiniJinja "... X is unknown" detail
pub fn extract_unknown_name(detail: &str) -> Option<String> {
    let (head, _) = detail.split_once(" is unknown")?;
    let name = head
        .rsplit(' ')
        .next()?
        .trim_matches(|c| matches!(c, '`' | '\'' | '"'));
    (!name.is_empty()).then(|| name.to_string())
}
