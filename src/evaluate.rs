//! The kernel: `normalize` turns any record collection into a sorted,
//! key-deduplicated one, and `evaluate` walks the expression tree bottom-up,
//! merging each node's two (already normalized) child results in one linear
//! pass. Results hold references into the per-input collections, so child
//! results are dropped as soon as their parent has merged them while the
//! input storage lives on.

use std::cmp::Ordering;

use crate::compare::{cross_key, same_key};
use crate::expr::{Expr, ExprKind, Op};
use crate::mask::FieldMask;
use crate::record::Record;

/// Sorts `records` by the key `mask` selects and keeps the first record
/// with each key. Records the mask gives no key at all (no selected column
/// below their column count) are dropped first. The sort is stable, so the
/// surviving record of a duplicated key is the earliest one in the
/// collection's incoming order. Normalizing twice is the same as
/// normalizing once.
pub fn normalize<'a>(records: &mut Vec<&'a Record<'a>>, mask: FieldMask) {
    records.retain(|record| !mask.selects_none_of(record.field_count()));
    records.sort_by(|x, y| same_key(x, y, mask));
    records.dedup_by(|x, y| same_key(x, y, mask) == Ordering::Equal);
}

/// Evaluates `expr` over the per-input record collections and returns the
/// root's result, normalized under the root's mask. Every subexpression's
/// result is independently normalized under that subexpression's own mask
/// before its parent consumes it.
#[must_use]
pub fn evaluate<'a>(expr: &Expr, inputs: &'a [Vec<Record<'a>>]) -> Vec<&'a Record<'a>> {
    let mut result = match &expr.kind {
        ExprKind::Input(index) => inputs[*index].iter().collect(),
        ExprKind::Op(op, left, right) => {
            let lhs = evaluate(left, inputs);
            let rhs = evaluate(right, inputs);
            merge(*op, left, &lhs, right, &rhs)
        }
    };
    normalize(&mut result, expr.mask);
    result
}

/// One linear pass over two normalized collections. When both sides carry
/// an equal key and one record must be chosen (union, intersection), the
/// side whose subtree starts at the earlier input wins; when both start
/// at the same input, the right side wins.
fn merge<'a>(
    op: Op,
    left: &Expr,
    lhs: &[&'a Record<'a>],
    right: &Expr,
    rhs: &[&'a Record<'a>],
) -> Vec<&'a Record<'a>> {
    let left_wins = left.source_id() < right.source_id();
    match op {
        Op::Union => union(lhs, left.mask, rhs, right.mask, left_wins),
        Op::Intersect => intersection(lhs, left.mask, rhs, right.mask, left_wins),
        Op::Diff => difference(lhs, left.mask, rhs, right.mask),
        Op::SymDiff => symmetric_difference(lhs, left.mask, rhs, right.mask),
    }
}

fn union<'a>(
    lhs: &[&'a Record<'a>],
    left_mask: FieldMask,
    rhs: &[&'a Record<'a>],
    right_mask: FieldMask,
    left_wins: bool,
) -> Vec<&'a Record<'a>> {
    let mut out = Vec::with_capacity(lhs.len() + rhs.len());
    let (mut li, mut ri) = (0, 0);
    while li < lhs.len() && ri < rhs.len() {
        match cross_key(lhs[li], left_mask, rhs[ri], right_mask) {
            Ordering::Less => {
                out.push(lhs[li]);
                li += 1;
            }
            Ordering::Greater => {
                out.push(rhs[ri]);
                ri += 1;
            }
            Ordering::Equal => {
                out.push(if left_wins { lhs[li] } else { rhs[ri] });
                li += 1;
                ri += 1;
            }
        }
    }
    out.extend_from_slice(&lhs[li..]);
    out.extend_from_slice(&rhs[ri..]);
    out
}

fn intersection<'a>(
    lhs: &[&'a Record<'a>],
    left_mask: FieldMask,
    rhs: &[&'a Record<'a>],
    right_mask: FieldMask,
    left_wins: bool,
) -> Vec<&'a Record<'a>> {
    let mut out = Vec::with_capacity(lhs.len().min(rhs.len()));
    let (mut li, mut ri) = (0, 0);
    while li < lhs.len() && ri < rhs.len() {
        match cross_key(lhs[li], left_mask, rhs[ri], right_mask) {
            Ordering::Less => li += 1,
            Ordering::Greater => ri += 1,
            Ordering::Equal => {
                out.push(if left_wins { lhs[li] } else { rhs[ri] });
                li += 1;
                ri += 1;
            }
        }
    }
    out
}

fn difference<'a>(
    lhs: &[&'a Record<'a>],
    left_mask: FieldMask,
    rhs: &[&'a Record<'a>],
    right_mask: FieldMask,
) -> Vec<&'a Record<'a>> {
    let mut out = Vec::with_capacity(lhs.len());
    let (mut li, mut ri) = (0, 0);
    while li < lhs.len() && ri < rhs.len() {
        match cross_key(lhs[li], left_mask, rhs[ri], right_mask) {
            Ordering::Less => {
                out.push(lhs[li]);
                li += 1;
            }
            Ordering::Greater => ri += 1,
            Ordering::Equal => {
                li += 1;
                ri += 1;
            }
        }
    }
    out.extend_from_slice(&lhs[li..]);
    out
}

fn symmetric_difference<'a>(
    lhs: &[&'a Record<'a>],
    left_mask: FieldMask,
    rhs: &[&'a Record<'a>],
    right_mask: FieldMask,
) -> Vec<&'a Record<'a>> {
    let mut out = Vec::with_capacity(lhs.len() + rhs.len());
    let (mut li, mut ri) = (0, 0);
    while li < lhs.len() && ri < rhs.len() {
        match cross_key(lhs[li], left_mask, rhs[ri], right_mask) {
            Ordering::Less => {
                out.push(lhs[li]);
                li += 1;
            }
            Ordering::Greater => {
                out.push(rhs[ri]);
                ri += 1;
            }
            Ordering::Equal => {
                li += 1;
                ri += 1;
            }
        }
    }
    out.extend_from_slice(&lhs[li..]);
    out.extend_from_slice(&rhs[ri..]);
    out
}

#[allow(clippy::pedantic)]
#[cfg(test)]
mod test {
    use super::*;
    use crate::expr::parse;
    use crate::record::records_of;

    fn collections(texts: &[&'static [u8]]) -> Vec<Vec<Record<'static>>> {
        texts.iter().map(|text| records_of(text, b",", true, false)).collect()
    }

    fn lines(result: &[&Record]) -> Vec<String> {
        result
            .iter()
            .map(|record| {
                let fields: Vec<String> = (0..record.field_count())
                    .map(|i| String::from_utf8(record.field(i).unwrap().to_vec()).unwrap())
                    .collect();
                fields.join(",")
            })
            .collect()
    }

    fn run(expression: &str, texts: &[&'static [u8]]) -> Vec<String> {
        let expr = parse(expression, texts.len()).unwrap();
        let inputs = collections(texts);
        let result = evaluate(&expr, &inputs);
        lines(&result)
    }

    #[test]
    fn normalizing_sorts_dedups_and_keeps_the_earliest_duplicate() {
        let records = records_of(b"beta,2\nalpha,1\nbeta,3\n", b",", true, false);
        let mut refs: Vec<&Record> = records.iter().collect();
        normalize(&mut refs, FieldMask::single(0));
        assert_eq!(lines(&refs), vec!["alpha,1", "beta,2"]);
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let records = records_of(b"c\nb\na\nb\n", b",", true, false);
        let mut refs: Vec<&Record> = records.iter().collect();
        normalize(&mut refs, FieldMask::ALL);
        let once = refs.clone();
        normalize(&mut refs, FieldMask::ALL);
        assert_eq!(refs, once);
    }

    #[test]
    fn normalizing_drops_records_the_mask_gives_no_key() {
        let records = records_of(b"a,1\nb\n", b",", true, false);
        let mut refs: Vec<&Record> = records.iter().collect();
        normalize(&mut refs, FieldMask::single(1));
        assert_eq!(lines(&refs), vec!["a,1"]);
    }

    #[test]
    fn union_keeps_every_key_once() {
        let got = run("A | B", &[b"x,1\ny,2\n", b"y,2\nz,3\n"]);
        assert_eq!(got, vec!["x,1", "y,2", "z,3"]);
    }

    #[test]
    fn intersection_keeps_common_keys_only() {
        let got = run("A & B", &[b"x,1\ny,2\n", b"y,2\nz,3\n"]);
        assert_eq!(got, vec!["y,2"]);
    }

    #[test]
    fn difference_subtracts_right_keys_from_the_left() {
        let got = run("A - B", &[b"x,1\ny,2\n", b"y,2\nz,3\n"]);
        assert_eq!(got, vec!["x,1"]);
    }

    #[test]
    fn symmetric_difference_keeps_keys_on_exactly_one_side() {
        let got = run("A ^ B", &[b"x,1\ny,2\n", b"y,2\nz,3\n"]);
        assert_eq!(got, vec!["x,1", "z,3"]);
    }

    #[test]
    fn key_ties_go_to_the_earlier_input_from_either_side() {
        let a: &[u8] = b"key,from-a\n";
        let b: &[u8] = b"key,from-b\n";
        assert_eq!(run("A[0] & B[0]", &[a, b]), vec!["key,from-a"]);
        assert_eq!(run("B[0] & A[0]", &[a, b]), vec!["key,from-a"]);
        assert_eq!(run("A[0] | B[0]", &[a, b]), vec!["key,from-a"]);
        assert_eq!(run("B[0] | A[0]", &[a, b]), vec!["key,from-a"]);
    }

    #[test]
    fn tie_breaks_use_the_leftmost_leaf_of_each_subtree() {
        let a: &[u8] = b"key,one\n";
        let b: &[u8] = b"key,two\n";
        let c: &[u8] = b"key,three\n";
        // The right subtree (B | C) starts at input B, so the left side,
        // input A, still wins the tie at the top-level intersection.
        assert_eq!(run("A[0] & (B[0] | C[0])[0]", &[a, b, c]), vec!["key,one"]);
        // Flipped, the subtree holding A wins against plain B.
        assert_eq!(run("(A[0] | C[0])[0] & B[0]", &[a, b, c]), vec!["key,one"]);
    }

    #[test]
    fn a_tie_between_subtrees_of_the_same_input_keeps_the_right_record() {
        // Both subtrees are rooted in A, so neither starts earlier.
        let a: &[u8] = b"a,x\nb,a\n";
        assert_eq!(run("A[0] & A[1]", &[a]), vec!["b,a"]);
        assert_eq!(run("A[1] & A[0]", &[a]), vec!["a,x"]);
    }

    #[test]
    fn cross_mask_operands_align_positionally() {
        let got = run("A[1] & B[0]", &[b"payload,shared\nother,k2\n", b"shared,data\n"]);
        assert_eq!(got, vec!["payload,shared"]);
    }

    #[test]
    fn sym_diff_size_equals_union_minus_intersection() {
        let texts: &[&'static [u8]] = &[b"a\nb\nc\nd\n", b"c\nd\ne\nf\ng\n"];
        let union_size = run("A | B", texts).len();
        let intersection_size = run("A & B", texts).len();
        let sym_diff_size = run("A ^ B", texts).len();
        assert_eq!(sym_diff_size, union_size - intersection_size);
    }

    #[test]
    fn differences_and_intersection_partition_the_union() {
        let texts: &[&'static [u8]] = &[b"a,1\nb,2\nc,3\n", b"b,9\nc,8\nd,7\n"];
        let mut pieces = run("(A[0] - B[0])[0] | ((A[0] & B[0])[0] | (B[0] - A[0])[0])[0]", texts);
        let mut union = run("(A[0] | B[0])[0]", texts);
        pieces.sort();
        union.sort();
        assert_eq!(pieces, union);
    }

    #[test]
    fn subtree_results_are_renormalized_under_the_parent_mask() {
        // Under the child masks the two rows of A are distinct keys; the
        // parenthesized node's mask collapses them to one.
        let got = run("(A[0] | A[1])[1]", &[b"x,same\ny,same\n"]);
        assert_eq!(got, vec!["x,same"]);
    }

    #[test]
    fn an_empty_side_leaves_the_other_side_alone() {
        let texts: &[&'static [u8]] = &[b"a\nb\n", b"\n \n"];
        assert_eq!(run("A | B", texts), vec!["a", "b"]);
        assert_eq!(run("A - B", texts), vec!["a", "b"]);
        assert_eq!(run("A & B", texts), Vec::<String>::new());
        assert_eq!(run("A ^ B", texts), vec!["a", "b"]);
    }
}
