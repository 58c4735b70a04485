//! Todo payloads.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StashError};

const RESOURCE: &str = "todos";

/// A single todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub todo: String,
    pub completed: bool,
    pub user_id: i64,
}

impl Todo {
    /// Returns a copy with `completed` flipped.
    pub fn toggled(&self) -> Self {
        Self {
            completed: !self.completed,
            ..self.clone()
        }
    }

    /// Returns a copy with every field present in `patch` applied.
    pub fn patched(&self, patch: &UpdateTodoRequest) -> Self {
        Self {
            id: self.id,
            todo: patch.todo.clone().unwrap_or_else(|| self.todo.clone()),
            completed: patch.completed.unwrap_or(self.completed),
            user_id: patch.user_id.unwrap_or(self.user_id),
        }
    }
}

/// One page of todos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodosResponse {
    pub todos: Vec<Todo>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

impl TodosResponse {
    /// Returns the todo with the given id, if it is on this page.
    pub fn find(&self, id: i64) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    /// Returns true if the todo with the given id is on this page.
    pub fn contains(&self, id: i64) -> bool {
        self.find(id).is_some()
    }

    /// Returns a copy of this page with `f` applied to the todo `id`.
    pub fn map_todo(&self, id: i64, f: impl Fn(&Todo) -> Todo) -> Self {
        Self {
            todos: self
                .todos
                .iter()
                .map(|todo| if todo.id == id { f(todo) } else { todo.clone() })
                .collect(),
            ..self.clone()
        }
    }

    /// Number of pages for the given page size.
    pub fn total_pages(&self, page_size: u64) -> u64 {
        if page_size == 0 {
            return 0;
        }
        self.total.div_ceil(page_size)
    }
}

/// Payload for creating a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub todo: String,
    pub completed: bool,
    pub user_id: i64,
}

impl CreateTodoRequest {
    /// Creates a pending todo for `user_id`.
    pub fn new(todo: impl Into<String>, user_id: i64) -> Self {
        Self {
            todo: todo.into(),
            completed: false,
            user_id,
        }
    }

    /// Rejects empty text and non-positive user ids.
    pub fn validate(&self) -> Result<()> {
        if self.todo.trim().is_empty() {
            return Err(StashError::validation(RESOURCE, "todo", "cannot be empty"));
        }
        if self.user_id <= 0 {
            return Err(StashError::validation(RESOURCE, "userId", "must be positive"));
        }
        Ok(())
    }
}

/// Partial update of a todo. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

impl UpdateTodoRequest {
    /// Update that only sets `completed`.
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    /// Rejects an explicitly empty text.
    pub fn validate(&self) -> Result<()> {
        if let Some(text) = &self.todo
            && text.trim().is_empty()
        {
            return Err(StashError::validation(RESOURCE, "todo", "cannot be empty"));
        }
        Ok(())
    }
}

/// Response of a delete: the removed todo plus deletion metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTodoResponse {
    #[serde(flatten)]
    pub todo: Todo,
    pub is_deleted: bool,
    pub deleted_on: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: i64, completed: bool) -> Todo {
        Todo {
            id,
            todo: format!("todo {}", id),
            completed,
            user_id: 1,
        }
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{"id":5,"todo":"Buy milk","completed":false,"userId":26}"#;
        let todo: Todo = serde_json::from_str(json).unwrap();
        assert_eq!(todo.user_id, 26);
        assert!(!todo.completed);
    }

    #[test]
    fn test_delete_response_flattens_todo() {
        let json = r#"{"id":1,"todo":"x","completed":true,"userId":2,"isDeleted":true,"deletedOn":"2026-01-01T00:00:00.000Z"}"#;
        let deleted: DeleteTodoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(deleted.todo.id, 1);
        assert!(deleted.is_deleted);
    }

    #[test]
    fn test_patched_keeps_absent_fields() {
        let original = todo(5, false);
        let patched = original.patched(&UpdateTodoRequest::completed(true));

        assert!(patched.completed);
        assert_eq!(patched.todo, original.todo);
        assert_eq!(patched.user_id, original.user_id);
    }

    #[test]
    fn test_update_request_skips_absent_fields() {
        let json = serde_json::to_string(&UpdateTodoRequest::completed(true)).unwrap();
        assert_eq!(json, r#"{"completed":true}"#);
    }

    #[test]
    fn test_map_todo_only_touches_target() {
        let page = TodosResponse {
            todos: vec![todo(1, false), todo(5, false)],
            total: 2,
            skip: 0,
            limit: 30,
        };

        let mapped = page.map_todo(5, Todo::toggled);
        assert!(!mapped.find(1).unwrap().completed);
        assert!(mapped.find(5).unwrap().completed);
    }

    #[test]
    fn test_total_pages() {
        let page = TodosResponse {
            todos: vec![],
            total: 254,
            skip: 0,
            limit: 10,
        };
        assert_eq!(page.total_pages(10), 26);
        assert_eq!(page.total_pages(0), 0);
    }

    #[test]
    fn test_create_validation() {
        assert!(CreateTodoRequest::new("Buy milk", 1).validate().is_ok());
        assert!(CreateTodoRequest::new("   ", 1).validate().is_err());
        assert!(CreateTodoRequest::new("Buy milk", 0).validate().is_err());
    }
}
