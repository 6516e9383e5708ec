use serde::{Deserialize, Serialize};

/// One physical desk. Position is 1-based and stable for the whole session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Desk {
    pub label: String,
    pub position: u32,
    /// Occupant a slot falls back to when no booking exists; `None` means
    /// unassigned (the empty string).
    pub default_occupant: Option<String>,
}

impl Desk {
    pub fn default_occupant(&self) -> &str {
        self.default_occupant.as_deref().unwrap_or("")
    }
}

/// Fixed, ordered desk catalog. Configuration, not runtime state.
#[derive(Debug, Clone)]
pub struct DeskCatalog {
    desks: Vec<Desk>,
}

impl DeskCatalog {
    pub fn new(labels: Vec<String>) -> Self {
        let desks = labels
            .into_iter()
            .enumerate()
            .map(|(idx, label)| Desk {
                label,
                position: idx as u32 + 1,
                default_occupant: None,
            })
            .collect();
        Self { desks }
    }

    pub fn set_default_occupant(&mut self, label: &str, occupant: &str) -> bool {
        match self.desks.iter_mut().find(|d| d.label == label) {
            Some(desk) => {
                desk.default_occupant = Some(occupant.to_string());
                true
            }
            None => false,
        }
    }

    pub fn by_position(&self, position: u32) -> Option<&Desk> {
        if position == 0 {
            return None;
        }
        self.desks.get(position as usize - 1)
    }

    pub fn by_label(&self, label: &str) -> Option<&Desk> {
        self.desks.iter().find(|d| d.label == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Desk> {
        self.desks.iter()
    }

    pub fn len(&self) -> usize {
        self.desks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.desks.is_empty()
    }
}

/// Fixed set of bookable team-member names. The empty string is always a
/// valid sentinel for "unassigned".
#[derive(Debug, Clone)]
pub struct TeamRoster {
    members: Vec<String>,
}

impl TeamRoster {
    pub fn new(members: Vec<String>) -> Self {
        Self { members }
    }

    pub fn contains(&self, name: &str) -> bool {
        name.is_empty() || self.members.iter().any(|m| m == name)
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }
}
