//! CRUD over the visited-point collection.
//!
//! Every operation reads the whole collection from the store and writes the
//! whole collection back. Nothing is cached, so two surfaces sharing one
//! store always observe each other's writes.

use crate::store::{read_json, write_json, SharedStore, StoreResult, HOUSES_KEY};
use crate::types::{PointId, VisitedPoint};

#[derive(Clone)]
pub struct PointRepository {
    store: SharedStore,
}

impl PointRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// All stored points; empty when nothing was ever saved.
    pub fn list(&self) -> StoreResult<Vec<VisitedPoint>> {
        Ok(read_json(self.store.as_ref(), HOUSES_KEY)?.unwrap_or_default())
    }

    pub fn get(&self, id: PointId) -> StoreResult<Option<VisitedPoint>> {
        Ok(self.list()?.into_iter().find(|p| p.id == id))
    }

    pub fn add(&self, point: VisitedPoint) -> StoreResult<()> {
        let mut points = self.list()?;
        log::debug!("Adding point {} at {}", point.id, point.position());
        points.push(point);
        self.save(&points)
    }

    /// Replace the entry with the same id. Returns `false` when no entry
    /// matched; the collection is then left as it was.
    pub fn update(&self, point: VisitedPoint) -> StoreResult<bool> {
        let mut points = self.list()?;
        let mut replaced = false;
        for existing in points.iter_mut().filter(|p| p.id == point.id) {
            *existing = point.clone();
            replaced = true;
        }
        if !replaced {
            log::debug!("Update skipped: no point with id {}", point.id);
        }
        self.save(&points)?;
        Ok(replaced)
    }

    /// Remove the entry with `id`. Returns `false` when it was absent.
    pub fn delete(&self, id: PointId) -> StoreResult<bool> {
        let mut points = self.list()?;
        let before = points.len();
        points.retain(|p| p.id != id);
        let removed = points.len() != before;
        self.save(&points)?;
        Ok(removed)
    }

    fn save(&self, points: &[VisitedPoint]) -> StoreResult<()> {
        write_json(self.store.as_ref(), HOUSES_KEY, points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, MemoryStore, StoreError};
    use std::sync::Arc;

    fn point(id: PointId, lat: f64, lng: f64) -> VisitedPoint {
        VisitedPoint {
            id,
            street: None,
            number: None,
            visited: true,
            lat,
            lng,
            visited_at: None,
        }
    }

    fn repo() -> (Arc<MemoryStore>, PointRepository) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), PointRepository::new(store))
    }

    #[test]
    fn test_list_absent_key_is_empty() -> StoreResult<()> {
        let (_, repo) = repo();
        assert!(repo.list()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_add_single_point() -> StoreResult<()> {
        let (_, repo) = repo();
        repo.add(point(1, 40.0, -73.0))?;
        let points = repo.list()?;
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].lat, 40.0);
        assert_eq!(points[0].lng, -73.0);
        assert!(points[0].visited);
        Ok(())
    }

    #[test]
    fn test_update_replaces_only_matching_id() -> StoreResult<()> {
        let (_, repo) = repo();
        repo.add(point(1, 40.0, -73.0))?;
        repo.add(point(2, 42.0, -71.0))?;
        assert!(repo.update(point(1, 41.0, -73.0))?);

        let points = repo.list()?;
        assert_eq!(points[0].id, 1);
        assert_eq!(points[0].lat, 41.0);
        assert_eq!(points[1], point(2, 42.0, -71.0));
        Ok(())
    }

    #[test]
    fn test_update_missing_id_is_noop() -> StoreResult<()> {
        let (_, repo) = repo();
        repo.add(point(1, 40.0, -73.0))?;
        assert!(!repo.update(point(99, 0.0, 0.0))?);
        assert_eq!(repo.list()?, vec![point(1, 40.0, -73.0)]);
        Ok(())
    }

    #[test]
    fn test_delete_missing_id_is_noop() -> StoreResult<()> {
        let (_, repo) = repo();
        repo.add(point(1, 40.0, -73.0))?;
        assert!(!repo.delete(7)?);
        assert!(repo.delete(1)?);
        assert!(repo.list()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_malformed_collection_propagates() {
        let (store, repo) = repo();
        store.set(HOUSES_KEY, "{\"not\":\"an array\"}").unwrap();
        assert!(matches!(repo.list(), Err(StoreError::Parse { .. })));
        assert!(repo.add(point(1, 0.0, 0.0)).is_err());
    }

    #[test]
    fn test_reads_fresh_collection_each_call() -> StoreResult<()> {
        let (store, repo) = repo();
        let other = PointRepository::new(store);
        repo.add(point(1, 1.0, 1.0))?;
        other.add(point(2, 2.0, 2.0))?;
        assert_eq!(repo.list()?.len(), 2);
        assert_eq!(repo.get(2)?.map(|p| p.lat), Some(2.0));
        Ok(())
    }
}
