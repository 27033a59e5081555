//! Normalized client-side record cache.
//!
//! Every entity lives once in a keyed [`Table`]; the [`Viewer`] holds the
//! ordered id lists that screens render from.

use std::collections::HashMap;

use api_types::{Notification, Task, Team, TeamMember};

/// An entity with a stable id that can be stored in a [`Table`].
pub trait Record: Clone {
    fn id(&self) -> &str;
}

impl Record for Team {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for TeamMember {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Task {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Notification {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone)]
pub struct Table<T> {
    rows: HashMap<String, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<T: Record> Table<T> {
    pub fn get(&self, id: &str) -> Option<&T> {
        self.rows.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.rows.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    /// Insert the record, overwriting any row with the same id. Returns the
    /// previous row.
    pub fn upsert(&mut self, record: T) -> Option<T> {
        self.rows.insert(record.id().to_string(), record)
    }

    pub fn delete(&mut self, id: &str) -> Option<T> {
        self.rows.remove(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }
}

/// The signed-in user and the lists hanging off them.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub id: String,
    pub team_ids: Vec<String>,
    /// Newest first.
    pub notification_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    pub viewer: Viewer,
    pub teams: Table<Team>,
    pub team_members: Table<TeamMember>,
    pub tasks: Table<Task>,
    pub notifications: Table<Notification>,
}

impl RecordStore {
    pub fn new(viewer_id: impl Into<String>) -> Self {
        Self {
            viewer: Viewer {
                id: viewer_id.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Add a team the viewer belongs to.
    pub fn insert_team(&mut self, team: Team) {
        if !self.viewer.team_ids.contains(&team.id) {
            self.viewer.team_ids.push(team.id.clone());
        }
        self.teams.upsert(team);
    }

    pub fn tasks_for_team(&self, team_id: &str) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .values()
            .filter(|task| task.team_id == team_id)
            .collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        tasks
    }
}
