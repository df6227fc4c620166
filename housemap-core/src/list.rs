//! List surface: the visited points as editable rows.

use crate::app::SurfaceContext;
use crate::nav::NavigationBus;
use crate::prompt::UserPrompt;
use crate::repository::PointRepository;
use crate::store::StoreError;
use crate::types::{JumpRequest, PointId, View, VisitedPoint, Zoom};
use thiserror::Error;

pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this marker?";

#[derive(Debug, Error)]
pub enum ListError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("No point with id {0}")]
    UnknownPoint(PointId),
}

pub type ListResult<T> = Result<T, ListError>;

/// A single field change made in a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointEdit {
    Street(String),
    Number(String),
}

pub struct ListSurface<P> {
    points: PointRepository,
    nav: NavigationBus,
    prompt: P,
    rows: Vec<VisitedPoint>,
    jump_zoom: Zoom,
}

impl<P: UserPrompt> ListSurface<P> {
    pub fn new(context: &SurfaceContext, prompt: P) -> Self {
        Self {
            points: context.points.clone(),
            nav: context.nav.clone(),
            prompt,
            rows: Vec::new(),
            jump_zoom: context.settings.jump_zoom,
        }
    }

    /// Load the collection. The rows are not refreshed while the surface
    /// stays active.
    pub fn activate(&mut self) -> ListResult<&[VisitedPoint]> {
        self.rows = self.points.list()?;
        Ok(&self.rows)
    }

    pub fn points(&self) -> &[VisitedPoint] {
        &self.rows
    }

    /// Apply one field change and write it through immediately. An empty
    /// value clears the label.
    pub fn edit(&mut self, id: PointId, edit: PointEdit) -> ListResult<()> {
        let row = self
            .rows
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(ListError::UnknownPoint(id))?;
        let normalize = |value: String| if value.trim().is_empty() { None } else { Some(value) };
        match edit {
            PointEdit::Street(value) => row.street = normalize(value),
            PointEdit::Number(value) => row.number = normalize(value),
        }
        if !self.points.update(row.clone())? {
            log::warn!("Point {} no longer stored; edit not saved", id);
        }
        Ok(())
    }

    /// Delete after the user confirms, then reload. Returns whether the
    /// point was deleted.
    pub fn delete(&mut self, id: PointId) -> ListResult<bool> {
        if !self.prompt.confirm(DELETE_CONFIRMATION) {
            log::debug!("Delete of {} cancelled", id);
            return Ok(false);
        }
        let removed = self.points.delete(id)?;
        self.rows = self.points.list()?;
        Ok(removed)
    }

    /// Ask the map to center on a point and hand focus to the map view.
    pub fn jump_to(&self, id: PointId) -> ListResult<View> {
        let point = self
            .rows
            .iter()
            .find(|p| p.id == id)
            .ok_or(ListError::UnknownPoint(id))?;
        self.nav.jump_to(JumpRequest::new(point.position(), Some(self.jump_zoom)));
        Ok(View::Map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{App, MapSettings};
    use crate::prompt::RecordingPrompt;
    use crate::store::MemoryStore;
    use crate::types::LatLng;
    use std::sync::Arc;

    fn point(id: PointId) -> VisitedPoint {
        VisitedPoint {
            id,
            street: None,
            number: None,
            visited: true,
            lat: id as f64,
            lng: -(id as f64),
            visited_at: None,
        }
    }

    fn app_with(ids: &[PointId]) -> App {
        let app = App::new(Arc::new(MemoryStore::new()), MapSettings::default());
        for &id in ids {
            app.points().add(point(id)).unwrap();
        }
        app
    }

    #[test]
    fn test_edit_writes_through() -> ListResult<()> {
        let app = app_with(&[1, 2]);
        let mut list = app.list_surface(RecordingPrompt::new(true));
        list.activate()?;
        list.edit(1, PointEdit::Street("Main St".into()))?;
        list.edit(1, PointEdit::Number("42".into()))?;

        let stored = app.points().get(1)?.expect("point 1");
        assert_eq!(stored.street.as_deref(), Some("Main St"));
        assert_eq!(stored.number.as_deref(), Some("42"));

        list.edit(1, PointEdit::Number("  ".into()))?;
        assert_eq!(app.points().get(1)?.and_then(|p| p.number), None);
        assert!(matches!(
            list.edit(9, PointEdit::Street("x".into())),
            Err(ListError::UnknownPoint(9))
        ));
        Ok(())
    }

    #[test]
    fn test_delete_requires_confirmation() -> ListResult<()> {
        let app = app_with(&[1, 2]);
        let prompt = Arc::new(RecordingPrompt::new(true).with_answers([false]));
        let mut list = app.list_surface(prompt.clone());
        list.activate()?;

        assert!(!list.delete(1)?);
        assert_eq!(app.points().list()?.len(), 2);

        assert!(list.delete(1)?);
        assert_eq!(list.points(), &[point(2)]);
        assert_eq!(prompt.questions(), vec![DELETE_CONFIRMATION, DELETE_CONFIRMATION]);
        Ok(())
    }

    #[test]
    fn test_rows_are_not_live() -> ListResult<()> {
        let app = app_with(&[1]);
        let mut list = app.list_surface(RecordingPrompt::new(true));
        list.activate()?;
        app.points().add(point(2))?;
        assert_eq!(list.points().len(), 1);
        assert_eq!(list.activate()?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_jump_publishes_request() -> ListResult<()> {
        let app = app_with(&[3]);
        let mut list = app.list_surface(RecordingPrompt::new(true));
        list.activate()?;
        assert_eq!(list.jump_to(3)?, View::Map);
        assert_eq!(
            app.nav().current(),
            Some(JumpRequest::new(LatLng::new(3.0, -3.0), Some(16.0)))
        );
        Ok(())
    }
}
