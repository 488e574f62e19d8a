//! Literal-set extraction from regexp matchers.
//!
//! A regexp matcher like `job=~"api|web"` is equivalent to a finite set of
//! literal values. Entries can then be accepted by a set lookup instead of
//! running the regex engine per row. Extraction walks the parsed HIR and
//! only recognizes alternations and concatenations of plain literals;
//! anything else (classes, repetitions, anchors, case-insensitive flags)
//! yields an empty set and the caller falls back to full matching.

use regex_syntax::hir::{Hir, HirKind};
use regex_syntax::Parser;

/// Returns the finite set of literals equivalent to `pattern`, or an empty
/// vector if the pattern is not provably a finite set.
pub(crate) fn find_set_matches(pattern: &str) -> Vec<String> {
    let hir = match Parser::new().parse(pattern) {
        Ok(hir) => hir,
        Err(_) => return Vec::new(),
    };
    set_from_hir(&hir).unwrap_or_default()
}

fn set_from_hir(hir: &Hir) -> Option<Vec<String>> {
    match hir.kind() {
        HirKind::Empty => Some(vec![String::new()]),
        HirKind::Literal(literal) => {
            Some(vec![String::from_utf8(literal.0.to_vec()).ok()?])
        }
        HirKind::Capture(capture) => set_from_hir(&capture.sub),
        HirKind::Concat(parts) => {
            // A concatenation is only a literal if every part is a single
            // literal; "foo(a|b)" is finite but left for the regex engine.
            let mut value = String::new();
            for part in parts {
                let mut literals = set_from_hir(part)?;
                if literals.len() != 1 {
                    return None;
                }
                value.push_str(&literals.pop().expect("len checked"));
            }
            Some(vec![value])
        }
        HirKind::Alternation(branches) => {
            let mut values = Vec::with_capacity(branches.len());
            for branch in branches {
                values.extend(set_from_hir(branch)?);
            }
            Some(values)
        }
        _ => None,
    }
}
