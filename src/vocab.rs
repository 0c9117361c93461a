//! Entity and relation id maps.
//!
//! Entities and relations share one contiguous id space: entities take
//! `[0, E)` in first-seen order (heads first, then tails), relations take
//! `[E, E + R)` in first-seen order. Walks store both kinds of step in one
//! integer array, which is why the ranges must not collide.

use crate::{Error, IndexedTriple, Result, Triple};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Bijective label <-> id maps, built once and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Vocabulary<L = String> {
    entities: Vec<L>,
    entity_ids: HashMap<L, i64>,
    relations: Vec<L>,
    relation_ids: HashMap<L, i64>,
}

impl<L> Vocabulary<L>
where
    L: Eq + Hash + Clone + Debug,
{
    /// Build the maps from a labeled triple table.
    pub fn from_triples(table: &[Triple<L>]) -> Self {
        let mut entities = Vec::new();
        let mut entity_ids = HashMap::new();

        let heads = table.iter().map(|t| &t.head);
        let tails = table.iter().map(|t| &t.tail);
        for label in heads.chain(tails) {
            if !entity_ids.contains_key(label) {
                entity_ids.insert(label.clone(), entities.len() as i64);
                entities.push(label.clone());
            }
        }

        let offset = entities.len() as i64;
        let mut relations = Vec::new();
        let mut relation_ids = HashMap::new();
        for t in table {
            if !relation_ids.contains_key(&t.relation) {
                relation_ids.insert(t.relation.clone(), offset + relations.len() as i64);
                relations.push(t.relation.clone());
            }
        }

        Self {
            entities,
            entity_ids,
            relations,
            relation_ids,
        }
    }

    /// Id of an entity label.
    pub fn entity_id(&self, label: &L) -> Result<i64> {
        self.entity_ids
            .get(label)
            .copied()
            .ok_or_else(|| Error::UnknownLabel {
                kind: "entity",
                label: format!("{label:?}"),
            })
    }

    /// Id of a relation label.
    pub fn relation_id(&self, label: &L) -> Result<i64> {
        self.relation_ids
            .get(label)
            .copied()
            .ok_or_else(|| Error::UnknownLabel {
                kind: "relation",
                label: format!("{label:?}"),
            })
    }

    /// Substitute ids for every label of a triple.
    pub fn encode(&self, triple: &Triple<L>) -> Result<IndexedTriple> {
        Ok(IndexedTriple::new(
            self.entity_id(&triple.head)?,
            self.relation_id(&triple.relation)?,
            self.entity_id(&triple.tail)?,
        ))
    }

    /// Label for an id in either range.
    pub fn label(&self, id: i64) -> Option<&L> {
        let id = usize::try_from(id).ok()?;
        let e = self.entities.len();
        if id < e {
            self.entities.get(id)
        } else {
            self.relations.get(id - e)
        }
    }
}

impl<L> Vocabulary<L> {
    pub fn num_entities(&self) -> usize {
        self.entities.len()
    }

    pub fn num_relations(&self) -> usize {
        self.relations.len()
    }

    /// Total number of ids, `E + R`.
    pub fn len(&self) -> usize {
        self.entities.len() + self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entity ids `0..E`.
    pub fn entity_ids(&self) -> Vec<i64> {
        (0..self.entities.len() as i64).collect()
    }

    /// Relation ids `E..E+R`.
    pub fn relation_ids(&self) -> Vec<i64> {
        let e = self.entities.len() as i64;
        (e..e + self.relations.len() as i64).collect()
    }

    /// Entity labels in id order.
    pub fn entities(&self) -> &[L] {
        &self.entities
    }

    /// Relation labels in id order (id = `E + position`).
    pub fn relations(&self) -> &[L] {
        &self.relations
    }

    /// Largest assigned id, or `None` for an empty vocabulary.
    pub fn max_id(&self) -> Option<i64> {
        (self.len() as i64).checked_sub(1).filter(|&m| m >= 0)
    }

    /// Conventional padding id: one past the largest real id.
    pub fn padding_idx(&self) -> i64 {
        self.len() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<Triple> {
        vec![
            Triple::new("A", "r1", "B"),
            Triple::new("B", "r2", "D"),
            Triple::new("C", "r1", "E"),
        ]
    }

    #[test]
    fn test_first_seen_order_heads_then_tails() {
        let vocab = Vocabulary::from_triples(&table());
        let names: Vec<&str> = vocab.entities().iter().map(String::as_str).collect();
        assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(vocab.relation_id(&"r1".to_string()).unwrap(), 5);
        assert_eq!(vocab.relation_id(&"r2".to_string()).unwrap(), 6);
        assert_eq!(vocab.padding_idx(), 7);
        assert_eq!(vocab.max_id(), Some(6));
    }

    #[test]
    fn test_label_lookup_is_bijective() {
        let vocab = Vocabulary::from_triples(&table());
        for id in 0..vocab.len() as i64 {
            let label = vocab.label(id).unwrap();
            let back = if id < vocab.num_entities() as i64 {
                vocab.entity_id(label).unwrap()
            } else {
                vocab.relation_id(label).unwrap()
            };
            assert_eq!(back, id);
        }
        assert!(vocab.label(-1).is_none());
        assert!(vocab.label(vocab.len() as i64).is_none());
    }

    #[test]
    fn test_unknown_label_fails() {
        let vocab = Vocabulary::from_triples(&table());
        let err = vocab.encode(&Triple::new("A", "r9", "B")).unwrap_err();
        assert!(matches!(err, Error::UnknownLabel { kind: "relation", .. }));
        assert!(vocab.entity_id(&"Z".to_string()).is_err());
    }

    #[test]
    fn test_empty_vocabulary() {
        let vocab: Vocabulary = Vocabulary::from_triples(&[]);
        assert!(vocab.is_empty());
        assert_eq!(vocab.max_id(), None);
        assert_eq!(vocab.padding_idx(), 0);
    }
}
