//! Resource comparator for installed resources vs catalog templates.
//!
//! This module computes the structural difference between the properties of
//! one installed resource and its candidate template, plus the auxiliary
//! line diff for query bodies and set diff for tactic/technique lists.

use std::collections::BTreeSet;
use std::fmt::Write;

use serde::Serialize;

use crate::model::{Difference, PropertyChange, PropertyMap, PropertyValue};

/// Lines of unchanged context around each hunk of a query diff.
const DIFF_CONTEXT_LINES: usize = 3;

/// Largest LCS table built for a query diff.
const MAX_LCS_CELLS: usize = 1 << 22;

/// Comparator for resource property maps.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResourceComparator;

/// Result of comparing two label lists as sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetDiff {
    /// Present in the template only.
    pub added: Vec<String>,
    /// Present in the installed resource only.
    pub removed: Vec<String>,
    /// Present in both.
    pub unchanged: Vec<String>,
}

/// One step of a line edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineOp {
    Equal,
    Delete,
    Insert,
}

/// A line edit with the cursor positions before it was applied.
#[derive(Debug, Clone, Copy)]
struct Edit {
    op: LineOp,
    current_pos: usize,
    template_pos: usize,
}

impl ResourceComparator {
    /// Creates a new comparator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Compares two property maps over the given comparable keys.
    ///
    /// Keys missing from a map compare as [`PropertyValue::Null`]. Lists
    /// compare as sets; the original lists are kept in the change record.
    #[must_use]
    pub fn compare(current: &PropertyMap, template: &PropertyMap, comparable_keys: &[&str]) -> Difference {
        let mut changes = Vec::new();

        for key in comparable_keys {
            let current_value = current.get(*key).unwrap_or(&PropertyValue::Null);
            let template_value = template.get(*key).unwrap_or(&PropertyValue::Null);

            if !current_value.equivalent(template_value) {
                changes.push(PropertyChange {
                    property_name: (*key).to_string(),
                    current_value: current_value.clone(),
                    template_value: template_value.clone(),
                });
            }
        }

        Difference::from_changes(changes)
    }

    /// Compares two label lists as sets.
    ///
    /// Output lists are sorted and free of duplicates.
    #[must_use]
    pub fn diff_sets(current: &[String], template: &[String]) -> SetDiff {
        let current: BTreeSet<&String> = current.iter().collect();
        let template: BTreeSet<&String> = template.iter().collect();

        SetDiff {
            added: template.difference(&current).map(|s| (*s).clone()).collect(),
            removed: current.difference(&template).map(|s| (*s).clone()).collect(),
            unchanged: current.intersection(&template).map(|s| (*s).clone()).collect(),
        }
    }

    /// Produces a unified line diff of two query bodies.
    ///
    /// Returns an empty string when the queries are identical.
    #[must_use]
    pub fn diff_text(current_query: &str, template_query: &str) -> String {
        if current_query == template_query {
            return String::new();
        }

        let current: Vec<&str> = current_query.lines().collect();
        let template: Vec<&str> = template_query.lines().collect();
        let edits = Self::edit_script(&current, &template);

        let mut output = String::from("--- Current Query\n+++ Template Query");

        for (start, end) in Self::hunk_ranges(&edits) {
            let hunk = &edits[start..end];
            let current_len = hunk.iter().filter(|e| e.op != LineOp::Insert).count();
            let template_len = hunk.iter().filter(|e| e.op != LineOp::Delete).count();

            let _ = write!(
                output,
                "\n@@ -{} +{} @@",
                format_range(hunk[0].current_pos, current_len),
                format_range(hunk[0].template_pos, template_len)
            );

            for edit in hunk {
                let _ = match edit.op {
                    LineOp::Equal => write!(output, "\n {}", current[edit.current_pos]),
                    LineOp::Delete => write!(output, "\n-{}", current[edit.current_pos]),
                    LineOp::Insert => write!(output, "\n+{}", template[edit.template_pos]),
                };
            }
        }

        output
    }

    /// Computes a line edit script.
    ///
    /// The common prefix and suffix are matched directly. The middle goes
    /// through a longest common subsequence table, unless that table would
    /// exceed [`MAX_LCS_CELLS`], in which case the middle is emitted as a
    /// block of deletions followed by a block of insertions.
    fn edit_script(current: &[&str], template: &[&str]) -> Vec<Edit> {
        let prefix = current
            .iter()
            .zip(template)
            .take_while(|(a, b)| a == b)
            .count();
        let suffix = current[prefix..]
            .iter()
            .rev()
            .zip(template[prefix..].iter().rev())
            .take_while(|(a, b)| a == b)
            .count();

        let current_end = current.len() - suffix;
        let template_end = template.len() - suffix;
        let middle_current = &current[prefix..current_end];
        let middle_template = &template[prefix..template_end];

        let mut edits = Vec::with_capacity(current.len() + template.len());
        edits.extend((0..prefix).map(|k| Edit {
            op: LineOp::Equal,
            current_pos: k,
            template_pos: k,
        }));

        if middle_current.len().saturating_mul(middle_template.len()) <= MAX_LCS_CELLS {
            Self::lcs_edits(middle_current, middle_template, prefix, &mut edits);
        } else {
            edits.extend((prefix..current_end).map(|i| Edit {
                op: LineOp::Delete,
                current_pos: i,
                template_pos: prefix,
            }));
            edits.extend((prefix..template_end).map(|j| Edit {
                op: LineOp::Insert,
                current_pos: current_end,
                template_pos: j,
            }));
        }

        edits.extend((0..suffix).map(|k| Edit {
            op: LineOp::Equal,
            current_pos: current_end + k,
            template_pos: template_end + k,
        }));

        edits
    }

    /// Appends a minimal edit script for `current` vs `template`, with
    /// positions shifted by `offset`.
    fn lcs_edits(current: &[&str], template: &[&str], offset: usize, edits: &mut Vec<Edit>) {
        let (n, m) = (current.len(), template.len());

        // lcs[i][j] = LCS length of current[i..] and template[j..]
        let mut lcs = vec![vec![0usize; m + 1]; n + 1];
        for i in (0..n).rev() {
            for j in (0..m).rev() {
                lcs[i][j] = if current[i] == template[j] {
                    lcs[i + 1][j + 1] + 1
                } else {
                    lcs[i + 1][j].max(lcs[i][j + 1])
                };
            }
        }

        let (mut i, mut j) = (0, 0);
        while i < n || j < m {
            let op = if i < n && j < m && current[i] == template[j] {
                LineOp::Equal
            } else if j >= m || (i < n && lcs[i + 1][j] >= lcs[i][j + 1]) {
                LineOp::Delete
            } else {
                LineOp::Insert
            };

            edits.push(Edit {
                op,
                current_pos: offset + i,
                template_pos: offset + j,
            });

            match op {
                LineOp::Equal => {
                    i += 1;
                    j += 1;
                }
                LineOp::Delete => i += 1,
                LineOp::Insert => j += 1,
            }
        }
    }

    /// Groups changed edits into hunk ranges with surrounding context.
    fn hunk_ranges(edits: &[Edit]) -> Vec<(usize, usize)> {
        let mut ranges: Vec<(usize, usize)> = Vec::new();

        for (idx, edit) in edits.iter().enumerate() {
            if edit.op == LineOp::Equal {
                continue;
            }

            let start = idx.saturating_sub(DIFF_CONTEXT_LINES);
            let end = (idx + 1 + DIFF_CONTEXT_LINES).min(edits.len());

            match ranges.last_mut() {
                Some(last) if start <= last.1 => last.1 = end,
                _ => ranges.push((start, end)),
            }
        }

        ranges
    }
}

/// Formats a unified-diff hunk range (`start,len`, 1-based).
fn format_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{len}", start + 1),
    }
}
