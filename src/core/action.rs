use std::fmt;

use axum::http::{Method, StatusCode};

/// The five CRUD operations a service implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    GetOne,
    Create,
    Update,
    Delete,
}

/// Which of the two path patterns an action is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathShape {
    /// `{prefix}`
    Collection,
    /// `{prefix}/{id}`
    Item,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::List,
        Action::GetOne,
        Action::Create,
        Action::Update,
        Action::Delete,
    ];

    /// HTTP method bound to this action.
    pub fn method(self) -> Method {
        match self {
            Action::List | Action::GetOne => Method::GET,
            Action::Create => Method::POST,
            Action::Update => Method::PATCH,
            Action::Delete => Method::DELETE,
        }
    }

    pub fn shape(self) -> PathShape {
        match self {
            Action::List | Action::Create => PathShape::Collection,
            Action::GetOne | Action::Update | Action::Delete => PathShape::Item,
        }
    }

    /// Looks up the action bound to `method` on a path of the given shape.
    pub fn from_method(shape: PathShape, method: &Method) -> Option<Action> {
        Action::ALL
            .into_iter()
            .find(|action| action.shape() == shape && action.method() == *method)
    }

    /// Status of a successful response.
    pub fn success_status(self) -> StatusCode {
        match self {
            Action::Create => StatusCode::CREATED,
            _ => StatusCode::OK,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::List => "list",
            Action::GetOne => "get-one",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_table() {
        use PathShape::*;
        assert_eq!(Action::from_method(Collection, &Method::GET), Some(Action::List));
        assert_eq!(Action::from_method(Collection, &Method::POST), Some(Action::Create));
        assert_eq!(Action::from_method(Item, &Method::GET), Some(Action::GetOne));
        assert_eq!(Action::from_method(Item, &Method::PATCH), Some(Action::Update));
        assert_eq!(Action::from_method(Item, &Method::DELETE), Some(Action::Delete));
    }

    #[test]
    fn test_unbound_methods() {
        use PathShape::*;
        assert_eq!(Action::from_method(Collection, &Method::PUT), None);
        assert_eq!(Action::from_method(Collection, &Method::DELETE), None);
        assert_eq!(Action::from_method(Item, &Method::POST), None);
        assert_eq!(Action::from_method(Item, &Method::PUT), None);
    }

    #[test]
    fn test_success_status() {
        assert_eq!(Action::Create.success_status(), StatusCode::CREATED);
        for action in [Action::List, Action::GetOne, Action::Update, Action::Delete] {
            assert_eq!(action.success_status(), StatusCode::OK);
        }
    }
}
