//! Graph fixtures for tests

use crate::graph::FlowGraph;
use crate::model::*;
use serde_json::json;

pub fn model(name: &str) -> Node {
    Node::new(NodeKind::Model.stable_id(name), name, NodeKind::Model)
}

pub fn controller(name: &str) -> Node {
    Node::new(NodeKind::Controller.stable_id(name), name, NodeKind::Controller)
}

/// Action ids follow `action_<controller>_<action>`.
pub fn action(controller: &str, name: &str) -> Node {
    let id = format!("{}_{}", NodeKind::Action.stable_id(controller), name);
    Node::new(id, name, NodeKind::Action).with_attribute("controller", json!(controller))
}

pub fn route(verb: &str, path: &str) -> Node {
    let name = format!("{} {}", verb, path);
    Node::new(route_id(verb, path), name, NodeKind::Route)
        .with_attribute(PATH_ATTRIBUTE, json!(path))
        .with_attribute("verb", json!(verb))
}

pub fn service(name: &str) -> Node {
    Node::new(NodeKind::Service.stable_id(name), name, NodeKind::Service)
}

pub fn edge(from: &Node, to: &Node, kind: EdgeKind) -> Edge {
    Edge::new(from.id.clone(), to.id.clone(), kind)
}

/// `User` and `Post`, with `Post belongs_to User`.
pub fn user_post_graph() -> FlowGraph {
    let user = model("User");
    let post = model("Post");

    let mut graph = FlowGraph::new();
    graph.add_edge(edge(&post, &user, EdgeKind::BelongsTo));
    graph.add_node(user);
    graph.add_node(post);
    graph
}

/// A small blog API: models, two controllers with actions, routes and a
/// service, plus an unconnected `AuditLog` model.
pub fn blog_graph() -> FlowGraph {
    let user = model("User").with_attribute(ASSOCIATIONS_ATTRIBUTE, json!(["posts", "comments"]));
    let post = model("Post").with_attribute(ASSOCIATIONS_ATTRIBUTE, json!(["user", "comments"]));
    let comment = model("Comment").with_attribute(ASSOCIATIONS_ATTRIBUTE, json!(["user", "post"]));
    let audit = model("AuditLog");

    let users = controller("Api::V1::UsersController");
    let posts = controller("Api::V1::PostsController");
    let users_index = action("Api::V1::UsersController", "index");
    let users_show = action("Api::V1::UsersController", "show");
    let posts_index = action("Api::V1::PostsController", "index");

    let users_route = route("GET", "/api/v1/users");
    let user_route = route("GET", "/api/v1/users/:id");
    let posts_route = route("GET", "/api/v1/posts");

    let user_service = service("UserService");

    let edges = vec![
        edge(&post, &user, EdgeKind::BelongsTo),
        edge(&comment, &user, EdgeKind::BelongsTo),
        edge(&comment, &post, EdgeKind::BelongsTo),
        edge(&user, &post, EdgeKind::HasMany),
        edge(&user, &comment, EdgeKind::HasMany),
        edge(&post, &comment, EdgeKind::HasMany),
        edge(&users, &users_index, EdgeKind::HasAction),
        edge(&users, &users_show, EdgeKind::HasAction),
        edge(&posts, &posts_index, EdgeKind::HasAction),
        edge(&users_route, &users_index, EdgeKind::RoutesTo),
        edge(&user_route, &users_show, EdgeKind::RoutesTo),
        edge(&posts_route, &posts_index, EdgeKind::RoutesTo),
        edge(&users_index, &user, EdgeKind::AccessesModel),
        edge(&users_show, &user, EdgeKind::AccessesModel),
        edge(&users_show, &user_service, EdgeKind::CallsService),
        edge(&posts_index, &post, EdgeKind::AccessesModel),
    ];

    let mut graph = FlowGraph::new();
    for node in [
        user, post, comment, audit, users, posts, users_index, users_show, posts_index,
        users_route, user_route, posts_route, user_service,
    ] {
        graph.add_node(node);
    }
    for edge in edges {
        graph.add_edge(edge);
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_graph_shape() {
        let graph = blog_graph();
        assert_eq!(graph.node_count(), 13);
        assert_eq!(graph.edge_count(), 16);
        assert_eq!(graph.dangling_edges().count(), 0);
        assert!(graph.find_node("controller_api/v1/users_controller").is_some());
        assert!(graph.find_node("action_api/v1/users_controller_show").is_some());
    }
}
