//! DAG Scheduler — validates a workflow's node/connection graph, orders it
//! topologically (Kahn's algorithm), and runs each node in order, threading
//! an accumulating results context from one node to the next.

use common::error::SchedulerError;
use common::types::{
    Connection, Credential, EvaluationContext, Node, Trigger, WorkflowRunResult,
};
use node_executor::{execute_node, NodeRegistry};
use std::collections::{HashMap, VecDeque};

/// Topologically order `nodes` by Kahn's algorithm.
///
/// Ties among ready nodes are broken FIFO by the input node ordering —
/// `nodes` is walked in order when seeding the initial ready queue and when
/// draining each node's adjacency list, so the result is stable given a
/// fixed input.
fn topological_order(nodes: &[Node], connections: &[Connection]) -> Result<Vec<i64>, SchedulerError> {
    let mut adjacency: HashMap<i64, Vec<i64>> = HashMap::new();
    let mut in_degree: HashMap<i64, usize> = HashMap::new();

    for node in nodes {
        in_degree.insert(node.id, 0);
    }

    for conn in connections {
        if !in_degree.contains_key(&conn.from) {
            return Err(SchedulerError::UnknownNode(conn.from));
        }
        if !in_degree.contains_key(&conn.to) {
            return Err(SchedulerError::UnknownNode(conn.to));
        }
        adjacency.entry(conn.from).or_default().push(conn.to);
        *in_degree.get_mut(&conn.to).unwrap() += 1;
    }

    let mut ready: VecDeque<i64> = nodes
        .iter()
        .map(|n| n.id)
        .filter(|id| in_degree[id] == 0)
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(id) = ready.pop_front() {
        order.push(id);
        if let Some(children) = adjacency.get(&id) {
            for &child in children {
                let degree = in_degree.get_mut(&child).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    ready.push_back(child);
                }
            }
        }
    }

    if order.len() != nodes.len() {
        return Err(SchedulerError::CycleOrDisconnect);
    }
    Ok(order)
}

/// Run a full workflow job: order its nodes, then execute each in turn,
/// resolving templates against the growing results context before dispatch.
pub async fn run_workflow(
    registry: &NodeRegistry,
    workflow_id: i64,
    nodes: &[Node],
    connections: &[Connection],
    credentials: &HashMap<String, Credential>,
    trigger: Option<Trigger>,
) -> Result<WorkflowRunResult, SchedulerError> {
    let order = topological_order(nodes, connections)?;
    let node_map: HashMap<i64, &Node> = nodes.iter().map(|n| (n.id, n)).collect();

    let mut context = EvaluationContext {
        results: HashMap::new(),
        trigger,
    };

    for id in &order {
        let node = node_map.get(id).ok_or(SchedulerError::NodeNotFound(*id))?;
        let resolved = template_resolver::resolve(&node.data, &context);
        let outcome = execute_node(registry, node, &resolved, credentials)
            .await
            .map_err(|e| SchedulerError::NodeFailed(e.to_string()))?;
        context
            .results
            .insert(id.to_string(), outcome.result.clone());
    }

    Ok(WorkflowRunResult {
        workflow_id,
        order,
        results: context.results,
    })
}

/// Run a single-node job: no topological sort, empty results context,
/// whatever trigger the job carries.
pub async fn run_single_node(
    registry: &NodeRegistry,
    node: &Node,
    credentials: &HashMap<String, Credential>,
    trigger: Option<Trigger>,
) -> Result<common::types::NodeResult, SchedulerError> {
    let context = EvaluationContext {
        results: HashMap::new(),
        trigger,
    };
    let resolved = template_resolver::resolve(&node.data, &context);
    execute_node(registry, node, &resolved, credentials)
        .await
        .map_err(|e| SchedulerError::NodeFailed(e.to_string()))
}
