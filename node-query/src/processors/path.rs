//! Splits a grouping path into its group-by levels and the node type it targets.

use crate::error::{QueryError, Result, ValidationError};
use crate::request::{GroupBy, NodeType, PathElement, PathType};

/// Maximum number of path elements, including the terminal node type
pub const MAX_PATH_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Grouping levels in path order, without the terminal element
    pub group_by: Vec<GroupBy>,
    pub node_type: NodeType,
}

/// Map an entity path type to the node type it selects
pub fn node_type_for(path_type: PathType) -> Result<NodeType> {
    match path_type {
        PathType::Hosts => Ok(NodeType::Host),
        PathType::Pods => Ok(NodeType::Pod),
        PathType::Containers => Ok(NodeType::Container),
        PathType::Terms | PathType::Filters => Err(QueryError::Internal(format!(
            "path type {path_type} does not select a node type"
        ))),
    }
}

pub fn resolve_path(path: &[PathElement]) -> Result<ResolvedPath> {
    let Some((last, groups)) = path.split_last() else {
        return Err(ValidationError::EmptyPath.into());
    };

    if path.len() > MAX_PATH_DEPTH {
        return Err(ValidationError::PathTooDeep {
            depth: path.len(),
            max: MAX_PATH_DEPTH,
        }
        .into());
    }

    let count = path
        .iter()
        .filter(|element| element.path_type().is_node_type())
        .count();
    if count > 1 {
        return Err(ValidationError::TooManyNodeTypes { count }.into());
    }

    let found = last.path_type();
    if !found.is_node_type() {
        return Err(ValidationError::InvalidTerminal { found }.into());
    }

    let node_type = node_type_for(found)?;
    let group_by = groups.iter().map(group_by_for).collect::<Result<Vec<_>>>()?;

    Ok(ResolvedPath {
        group_by,
        node_type,
    })
}

fn group_by_for(element: &PathElement) -> Result<GroupBy> {
    match element {
        PathElement::Terms { field, label } => Ok(GroupBy::Terms {
            field: field.clone(),
            label: label.clone(),
        }),
        PathElement::Filters { label, filters } => Ok(GroupBy::Filters {
            label: label.clone(),
            filters: filters.clone(),
        }),
        other => Err(QueryError::Internal(format!(
            "{} can not be used as a grouping level",
            other.path_type()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::PathFilter;

    fn validation_error(path: &[PathElement]) -> ValidationError {
        match resolve_path(path) {
            Err(QueryError::Validation(e)) => e,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_single_node_type() {
        let resolved = resolve_path(&[PathElement::pods()]).unwrap();
        assert_eq!(resolved.node_type, NodeType::Pod);
        assert!(resolved.group_by.is_empty());
    }

    #[test]
    fn test_groups_before_node_type() {
        let filters = vec![PathFilter::new("prod", Some("env:prod"))];
        let path = [
            PathElement::terms("cloud.region"),
            PathElement::filters(filters.clone()),
            PathElement::containers(),
        ];

        let resolved = resolve_path(&path).unwrap();
        assert_eq!(resolved.node_type, NodeType::Container);
        assert_eq!(
            resolved.group_by,
            vec![GroupBy::terms("cloud.region"), GroupBy::filters(filters)]
        );
    }

    #[test]
    fn test_labels_are_kept() {
        let path = [
            PathElement::Terms {
                field: "cloud.region".to_string(),
                label: Some("Region".to_string()),
            },
            PathElement::hosts(),
        ];

        let resolved = resolve_path(&path).unwrap();
        assert_eq!(
            resolved.group_by,
            vec![GroupBy::Terms {
                field: "cloud.region".to_string(),
                label: Some("Region".to_string()),
            }]
        );
    }

    #[test]
    fn test_empty_path() {
        assert_eq!(validation_error(&[]), ValidationError::EmptyPath);
    }

    #[test]
    fn test_path_too_deep() {
        let path = [
            PathElement::terms("a"),
            PathElement::terms("b"),
            PathElement::terms("c"),
            PathElement::hosts(),
        ];
        assert_eq!(
            validation_error(&path),
            ValidationError::PathTooDeep { depth: 4, max: 3 }
        );
    }

    #[test]
    fn test_too_many_node_types() {
        let path = [PathElement::hosts(), PathElement::pods()];
        assert_eq!(
            validation_error(&path),
            ValidationError::TooManyNodeTypes { count: 2 }
        );
    }

    #[test]
    fn test_invalid_terminal() {
        let path = [PathElement::hosts(), PathElement::terms("cloud.region")];
        assert_eq!(
            validation_error(&path),
            ValidationError::InvalidTerminal {
                found: PathType::Terms
            }
        );
    }

    #[test]
    fn test_node_type_for_non_entity_is_internal() {
        assert!(matches!(
            node_type_for(PathType::Filters),
            Err(QueryError::Internal(_))
        ));
        assert_eq!(node_type_for(PathType::Hosts).unwrap(), NodeType::Host);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_element() -> impl Strategy<Value = PathElement> {
            prop_oneof![
                "[a-z]{1,8}(\\.[a-z]{1,8})?".prop_map(PathElement::terms),
                proptest::collection::vec(
                    ("[a-z]{1,6}", proptest::option::of("[a-z]{1,6}:[a-z]{1,6}")),
                    0..3
                )
                .prop_map(|filters| {
                    PathElement::filters(
                        filters
                            .into_iter()
                            .map(|(label, query)| PathFilter { label, query })
                            .collect(),
                    )
                }),
                Just(PathElement::hosts()),
                Just(PathElement::pods()),
                Just(PathElement::containers()),
            ]
        }

        proptest! {
            #[test]
            fn resolves_iff_well_formed(path in proptest::collection::vec(arb_element(), 0..5)) {
                let node_types = path.iter().filter(|e| e.path_type().is_node_type()).count();
                let well_formed = !path.is_empty()
                    && path.len() <= MAX_PATH_DEPTH
                    && node_types == 1
                    && path.last().is_some_and(|e| e.path_type().is_node_type());

                match resolve_path(&path) {
                    Ok(resolved) => {
                        prop_assert!(well_formed);
                        let last = path.last().unwrap().path_type();
                        prop_assert_eq!(resolved.node_type, node_type_for(last).unwrap());
                        prop_assert_eq!(resolved.group_by.len(), path.len() - 1);
                        for (group, element) in resolved.group_by.iter().zip(&path) {
                            let matches = match (group, element) {
                                (GroupBy::Terms { field: a, .. }, PathElement::Terms { field: b, .. }) => a == b,
                                (GroupBy::Filters { filters: a, .. }, PathElement::Filters { filters: b, .. }) => a == b,
                                _ => false,
                            };
                            prop_assert!(matches);
                        }
                    }
                    Err(e) => {
                        prop_assert!(!well_formed);
                        prop_assert!(e.is_validation());
                    }
                }
            }

            #[test]
            fn resolution_is_repeatable(path in proptest::collection::vec(arb_element(), 0..5)) {
                prop_assert_eq!(resolve_path(&path), resolve_path(&path));
            }
        }
    }
}
