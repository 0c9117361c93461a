//! Triple indexing and the per-head range index.
//!
//! The walker only ever asks one question of the graph: "which triples have
//! this entity as head?". Sorting the triple array by head makes every answer a
//! contiguous row range, so the whole index is an `(N, 2)` table of inclusive
//! `(start, end)` offsets, CSR style.
//!
//! ```text
//! sorted triples          range index
//! row 0: (0, 5, 1)        0 -> (0, 1)
//! row 1: (0, 6, 3)        1 -> (2, 2)
//! row 2: (1, 6, 3)        2 -> (-1, -1)   no outgoing triples
//! row 3: (3, 7, 0)        3 -> (3, 3)
//! ```

use crate::{Error, Result, Triple, Vocabulary};
use ndarray::{Array2, ArrayView2};
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::RangeInclusive;
use tracing::debug;

/// Marker stored for entities without outgoing triples.
pub const NO_RANGE: i64 = -1;

/// Replace labels by ids.
///
/// Returns the `(T, 3)` triple array in input order together with the
/// [`Vocabulary`] that produced it.
///
/// # Example
///
/// ```rust
/// use triple_walk::{index_triples, Triple};
///
/// let table: Vec<Triple> = vec![
///     Triple::new("A", "r1", "B"),
///     Triple::new("B", "r2", "C"),
/// ];
/// let (triples, vocab) = index_triples(&table).unwrap();
/// assert_eq!(triples.row(0).to_vec(), vec![0, 3, 1]);
/// assert_eq!(triples.row(1).to_vec(), vec![1, 4, 2]);
/// assert_eq!(vocab.num_entities(), 3);
/// ```
pub fn index_triples<L>(table: &[Triple<L>]) -> Result<(Array2<i64>, Vocabulary<L>)>
where
    L: Eq + Hash + Clone + Debug,
{
    let vocab = Vocabulary::from_triples(table);

    let mut flat = Vec::with_capacity(table.len() * 3);
    for triple in table {
        flat.extend_from_slice(&vocab.encode(triple)?.to_array());
    }
    let triples = Array2::from_shape_vec((table.len(), 3), flat)?;

    debug!(
        triples = table.len(),
        entities = vocab.num_entities(),
        relations = vocab.num_relations(),
        "indexed triple table"
    );
    Ok((triples, vocab))
}

/// Inclusive row ranges into a head-sorted triple array, one row per entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadRangeIndex {
    ranges: Array2<i64>,
}

impl HeadRangeIndex {
    /// Wrap an existing `(N, 2)` range table.
    ///
    /// Every row must be `(-1, -1)` or satisfy `0 <= start <= end`.
    pub fn from_array(ranges: Array2<i64>) -> Result<Self> {
        if ranges.ncols() != 2 {
            return Err(Error::InvalidConfig(format!(
                "range index must have 2 columns, got {}",
                ranges.ncols()
            )));
        }
        for (entity, row) in ranges.rows().into_iter().enumerate() {
            let (start, end) = (row[0], row[1]);
            let unset = start == NO_RANGE && end == NO_RANGE;
            if !unset && (start < 0 || start > end) {
                return Err(Error::InvalidConfig(format!(
                    "entity {entity} has malformed range ({start}, {end})"
                )));
            }
        }
        Ok(Self { ranges })
    }

    /// Number of entity rows.
    pub fn len(&self) -> usize {
        self.ranges.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.nrows() == 0
    }

    /// Rows of the sorted triple array whose head is `entity`.
    ///
    /// `Ok(None)` for an entity with no outgoing triples.
    pub fn range(&self, entity: i64) -> Result<Option<RangeInclusive<usize>>> {
        let row = usize::try_from(entity)
            .ok()
            .filter(|&r| r < self.len())
            .ok_or(Error::EntityOutOfRange {
                entity,
                len: self.len(),
            })?;

        let (start, end) = (self.ranges[[row, 0]], self.ranges[[row, 1]]);
        if start == NO_RANGE || end == NO_RANGE {
            return Ok(None);
        }
        Ok(Some(start as usize..=end as usize))
    }

    /// Number of outgoing triples of `entity`.
    pub fn out_degree(&self, entity: i64) -> Result<usize> {
        Ok(self
            .range(entity)?
            .map_or(0, |r| r.end() - r.start() + 1))
    }

    pub fn as_array(&self) -> &Array2<i64> {
        &self.ranges
    }

    pub fn into_array(self) -> Array2<i64> {
        self.ranges
    }
}

/// Stable-sort triples by head and build the per-head range index.
///
/// The index has one row per id in `0..=max(entity_ids)`. Heads may leave
/// gaps; those entities keep `(-1, -1)`. Every head in `triples` must be a
/// valid row of the index.
pub fn build_head_range_index(
    triples: ArrayView2<'_, i64>,
    entity_ids: &[i64],
) -> Result<(HeadRangeIndex, Array2<i64>)> {
    if triples.ncols() != 3 {
        return Err(Error::InvalidConfig(format!(
            "triple array must have 3 columns, got {}",
            triples.ncols()
        )));
    }
    if let Some(&bad) = entity_ids.iter().find(|&&e| e < 0) {
        return Err(Error::InvalidConfig(format!("negative entity id {bad}")));
    }
    let num_entities = match entity_ids.iter().max() {
        None => 0,
        Some(&m) => index_rows(m)?,
    };

    let mut sorted: Vec<[i64; 3]> = triples
        .rows()
        .into_iter()
        .map(|r| [r[0], r[1], r[2]])
        .collect();
    // stable: rows sharing a head keep their input order
    sorted.sort_by_key(|t| t[0]);

    if let Some(t) = sorted
        .iter()
        .find(|t| t[0] < 0 || t[0] as usize >= num_entities)
    {
        return Err(Error::EntityOutOfRange {
            entity: t[0],
            len: num_entities,
        });
    }

    let mut ranges = Array2::from_elem((num_entities, 2), NO_RANGE);
    let mut open: Option<(i64, usize)> = None;
    let mut heads = 0usize;
    for (row, t) in sorted.iter().enumerate() {
        match open {
            Some((head, _)) if head == t[0] => {}
            Some((head, start)) => {
                close_range(&mut ranges, head, start, row - 1);
                open = Some((t[0], row));
                heads += 1;
            }
            None => {
                open = Some((t[0], row));
                heads += 1;
            }
        }
    }
    if let Some((head, start)) = open {
        close_range(&mut ranges, head, start, sorted.len() - 1);
    }

    let sorted_triples =
        Array2::from_shape_vec((sorted.len(), 3), sorted.into_iter().flatten().collect())?;

    debug!(
        triples = sorted_triples.nrows(),
        entities = num_entities,
        heads,
        "built head range index"
    );
    Ok((HeadRangeIndex { ranges }, sorted_triples))
}

/// Rows needed to address entity `max_id`, if the `(rows, 2)` table fits.
fn index_rows(max_id: i64) -> Result<usize> {
    usize::try_from(max_id)
        .ok()
        .and_then(|m| m.checked_add(1))
        .filter(|&rows| rows.checked_mul(2).is_some_and(|n| n <= isize::MAX as usize))
        .ok_or_else(|| {
            Error::InvalidConfig(format!("entity id {max_id} is too large to index"))
        })
}

fn close_range(ranges: &mut Array2<i64>, head: i64, start: usize, end: usize) {
    let row = head as usize;
    ranges[[row, 0]] = start as i64;
    ranges[[row, 1]] = end as i64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_range_index_with_gaps() {
        let triples = array![[3i64, 7, 0], [0, 5, 1], [1, 6, 3], [0, 6, 3]];
        let (index, sorted) = build_head_range_index(triples.view(), &[0, 1, 2, 3]).unwrap();

        assert_eq!(
            sorted,
            array![[0i64, 5, 1], [0, 6, 3], [1, 6, 3], [3, 7, 0]],
            "stable sort keeps input order within a head"
        );
        assert_eq!(index.as_array(), &array![[0i64, 1], [2, 2], [-1, -1], [3, 3]]);
        assert_eq!(index.range(0).unwrap(), Some(0..=1));
        assert_eq!(index.range(2).unwrap(), None);
        assert_eq!(index.out_degree(0).unwrap(), 2);
        assert_eq!(index.out_degree(2).unwrap(), 0);
    }

    #[test]
    fn test_range_out_of_bounds() {
        let triples = array![[0i64, 2, 1]];
        let (index, _) = build_head_range_index(triples.view(), &[0, 1]).unwrap();
        assert!(matches!(
            index.range(5),
            Err(Error::EntityOutOfRange { entity: 5, len: 2 })
        ));
        assert!(index.range(-1).is_err());
    }

    #[test]
    fn test_head_outside_entity_ids() {
        let triples = array![[4i64, 5, 0]];
        let err = build_head_range_index(triples.view(), &[0, 1]).unwrap_err();
        assert!(matches!(err, Error::EntityOutOfRange { entity: 4, .. }));
    }

    #[test]
    fn test_wrong_column_count() {
        let triples = array![[0i64, 1], [1, 0]];
        assert!(build_head_range_index(triples.view(), &[0, 1]).is_err());
        assert!(HeadRangeIndex::from_array(array![[0i64, 1, 2]]).is_err());
    }

    #[test]
    fn test_malformed_ranges_rejected() {
        // start past end
        assert!(matches!(
            HeadRangeIndex::from_array(array![[2i64, 0], [2, 2]]),
            Err(Error::InvalidConfig(_))
        ));
        // below the unset marker
        assert!(matches!(
            HeadRangeIndex::from_array(array![[-2i64, 0], [1, 1]]),
            Err(Error::InvalidConfig(_))
        ));
        // half unset
        assert!(HeadRangeIndex::from_array(array![[-1i64, 3]]).is_err());

        let index = HeadRangeIndex::from_array(array![[0i64, 1], [-1, -1], [2, 2]]).unwrap();
        assert_eq!(index.range(2).unwrap(), Some(2..=2));
        assert_eq!(index.range(1).unwrap(), None);
    }

    #[test]
    fn test_huge_entity_id_is_an_error() {
        let triples = array![[0i64, 2, 1]];
        assert!(matches!(
            build_head_range_index(triples.view(), &[0, i64::MAX]),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            build_head_range_index(triples.view(), &[0, i64::MAX / 2]),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_triples_leave_every_entity_unset() {
        let triples = Array2::<i64>::zeros((0, 3));
        let (index, sorted) = build_head_range_index(triples.view(), &[0, 1, 2]).unwrap();
        assert_eq!(sorted.nrows(), 0);
        assert!(index.as_array().iter().all(|&v| v == NO_RANGE));
    }

    #[test]
    fn test_index_labeled_table() {
        let table: Vec<Triple> = vec![
            Triple::new("A", "r1", "B"),
            Triple::new("B", "r2", "D"),
            Triple::new("A", "r1", "C"),
        ];
        let (triples, vocab) = index_triples(&table).unwrap();
        // heads A B, then tails D C; relations from 4
        assert_eq!(triples, array![[0i64, 4, 1], [1, 5, 2], [0, 4, 3]]);
        assert_eq!(vocab.relation_ids(), vec![4, 5]);

        let (index, sorted) = build_head_range_index(triples.view(), &vocab.entity_ids()).unwrap();
        assert_eq!(sorted, array![[0i64, 4, 1], [0, 4, 3], [1, 5, 2]]);
        assert_eq!(index.as_array(), &array![[0i64, 1], [2, 2], [-1, -1], [-1, -1]]);
    }
}
