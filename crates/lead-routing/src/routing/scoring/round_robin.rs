use super::AgentSnapshot;

/// Next agent in a team's rotation after `last_assignee`.
///
/// Only gate-eligible agents rotate. They are ordered by `round_robin_order`, agents
/// without one go last, and ties keep roster order. An unknown or absent `last_assignee`
/// restarts the rotation.
pub fn next_round_robin<'a>(
    agents: &'a [AgentSnapshot],
    last_assignee: Option<&str>,
) -> Option<&'a AgentSnapshot> {
    let mut rotation: Vec<&AgentSnapshot> =
        agents.iter().filter(|agent| agent.is_eligible()).collect();
    rotation.sort_by_key(|agent| (agent.round_robin_order.is_none(), agent.round_robin_order));

    let previous = last_assignee
        .and_then(|user_id| rotation.iter().position(|agent| agent.user_id == user_id));

    match previous {
        Some(index) => rotation.get((index + 1) % rotation.len()).copied(),
        None => rotation.first().copied(),
    }
}
