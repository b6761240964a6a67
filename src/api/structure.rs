use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use super::err::{Result, SchoolError};
use super::model::StructureNode;
use super::store::RecordStore;
use super::SchoolService;

/// 结构树节点，叶子节点的 `sub` 为空且不序列化
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TreeNodeView {
    pub title: String,
    #[serde(rename = "sub", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNodeView>,
}

/// Assembles the forest described by `nodes`.
///
/// Roots, and the children of every node, keep the order in which they
/// appear in `nodes`; sort the input first if another order is wanted.
/// Every `parent_id` must name a node of the same slice.
pub fn build_tree(nodes: &[StructureNode]) -> Result<Vec<TreeNodeView>> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        if index.insert(node.id, i).is_some() {
            return Err(SchoolError::Validation(format!(
                "structure node {} appears twice",
                node.id
            )));
        }
    }

    // children lists hold positions in `nodes`
    let mut children: Vec<Vec<usize>> = vec![vec![]; nodes.len()];
    let mut roots = vec![];
    for (i, node) in nodes.iter().enumerate() {
        match node.parent_id {
            None => roots.push(i),
            Some(parent) => {
                let &p = index.get(&parent).ok_or(SchoolError::DanglingReference {
                    node: node.id,
                    parent,
                })?;
                children[p].push(i);
            }
        }
    }

    // pre-order walk from the roots; a node never reached sits on a cycle
    let mut order = Vec::with_capacity(nodes.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(children[i].iter().rev());
    }
    if order.len() < nodes.len() {
        let mut reached = vec![false; nodes.len()];
        for &i in &order {
            reached[i] = true;
        }
        let stray = reached.iter().position(|r| !r).unwrap_or_default();
        return Err(SchoolError::CyclicStructure(nodes[stray].id));
    }

    // children come after their parent in `order`, so walking it backwards
    // finishes every subtree before its parent takes it
    let mut built: Vec<Option<TreeNodeView>> = vec![None; nodes.len()];
    for &i in order.iter().rev() {
        let sub = children[i]
            .iter()
            .filter_map(|&c| built[c].take())
            .collect();
        built[i] = Some(TreeNodeView {
            title: nodes[i].title.clone(),
            children: sub,
        });
    }

    Ok(roots.iter().filter_map(|&r| built[r].take()).collect())
}

impl<S: RecordStore> SchoolService<S> {
    /// The whole structure tree, siblings ordered by node id.
    pub async fn get_structure_tree(&self) -> Result<Vec<TreeNodeView>> {
        let mut nodes = self.store.structure_nodes().await?;
        nodes.sort_by_key(|node| node.id);
        debug!("building structure tree from {} nodes", nodes.len());
        build_tree(&nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fixture;
    use crate::api::store::MemoryStore;
    use serde_json::json;

    fn node(id: i64, title: &str, parent_id: Option<i64>) -> StructureNode {
        StructureNode {
            id,
            title: title.to_string(),
            parent_id,
        }
    }

    fn leaf(title: &str) -> TreeNodeView {
        TreeNodeView {
            title: title.to_string(),
            children: vec![],
        }
    }

    #[test]
    fn test_nested_forest() {
        let nodes = vec![
            node(4, "D", Some(2)),
            node(1, "A", None),
            node(2, "B", Some(1)),
            node(3, "C", Some(1)),
        ];
        let tree = build_tree(&nodes).unwrap();
        assert_eq!(
            tree,
            vec![TreeNodeView {
                title: "A".to_string(),
                children: vec![
                    TreeNodeView {
                        title: "B".to_string(),
                        children: vec![leaf("D")],
                    },
                    leaf("C"),
                ],
            }]
        );
    }

    #[test]
    fn test_input_order_is_kept() {
        let nodes = vec![
            node(2, "second root", None),
            node(1, "first root", None),
            node(4, "y", Some(1)),
            node(3, "x", Some(1)),
        ];
        let tree = build_tree(&nodes).unwrap();
        assert_eq!(tree[0].title, "second root");
        assert_eq!(tree[1].children, vec![leaf("y"), leaf("x")]);
    }

    #[test]
    fn test_dangling_parent() {
        let nodes = vec![node(1, "A", None), node(2, "B", Some(9))];
        let result = build_tree(&nodes);
        assert!(matches!(
            result,
            Err(SchoolError::DanglingReference { node: 2, parent: 9 })
        ));
    }

    #[test]
    fn test_cycle() {
        let nodes = vec![
            node(1, "A", None),
            node(2, "B", Some(3)),
            node(3, "C", Some(2)),
        ];
        assert!(matches!(
            build_tree(&nodes),
            Err(SchoolError::CyclicStructure(2))
        ));

        let own_parent = vec![node(5, "E", Some(5))];
        assert!(matches!(
            build_tree(&own_parent),
            Err(SchoolError::CyclicStructure(5))
        ));
    }

    #[test]
    fn test_duplicate_id() {
        let nodes = vec![node(1, "A", None), node(1, "A again", None)];
        assert!(matches!(build_tree(&nodes), Err(SchoolError::Validation(_))));
    }

    #[test]
    fn test_empty_input() {
        assert!(build_tree(&[]).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_structure_tree_serialization() {
        let service =
            SchoolService::new(MemoryStore::from_fixtures(&fixture::sample()).unwrap());
        let tree = service.get_structure_tree().await.unwrap();
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!([
                {
                    "title": "Lower secondary",
                    "sub": [
                        {
                            "title": "Grade 7",
                            "sub": [{ "title": "Room 7/1" }, { "title": "Room 7/2" }]
                        }
                    ]
                },
                {
                    "title": "Upper secondary",
                    "sub": [{ "title": "Grade 10" }]
                }
            ])
        );
    }
}
