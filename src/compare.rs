//! Key comparators. `same_key` orders records that share one mask, and
//! `cross_key` aligns the selected columns of records keyed by different
//! masks, which is what lets `A[1] & B[0]` match a second column against a
//! first. Columns compare byte-wise; there is no collation.

use std::cmp::Ordering;

use crate::mask::FieldMask;
use crate::record::Record;

/// Compares `x` and `y` column by column over the columns `mask` selects,
/// lowest index first. Selected columns past the end of both records are
/// ignored, except that when the mask reaches past the shorter record, the
/// record with fewer columns sorts first.
#[must_use]
pub fn same_key(x: &Record, y: &Record, mask: FieldMask) -> Ordering {
    let common = x.field_count().min(y.field_count());
    for index in mask.below(common).indices() {
        let ord = x.field(index).cmp(&y.field(index));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    if mask.reaches(common) {
        return x.field_count().cmp(&y.field_count());
    }
    Ordering::Equal
}

/// Compares records keyed by different masks by pairing their selected
/// columns positionally: the n-th column `x_mask` selects in `x` against
/// the n-th column `y_mask` selects in `y`. The record whose selected
/// columns run out first sorts first. Equal masks delegate to `same_key`.
#[must_use]
pub fn cross_key(x: &Record, x_mask: FieldMask, y: &Record, y_mask: FieldMask) -> Ordering {
    if x_mask == y_mask {
        return same_key(x, y, x_mask);
    }
    let mut xs = x_mask.below(x.field_count()).indices();
    let mut ys = y_mask.below(y.field_count()).indices();
    loop {
        match (xs.next(), ys.next()) {
            (Some(xi), Some(yi)) => {
                let ord = x.field(xi).cmp(&y.field(yi));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
        }
    }
}
