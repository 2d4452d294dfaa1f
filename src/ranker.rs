use crate::contract::SimulationResult;

/// Sorts by expected return, highest first. The sort is stable, so equal
/// expected returns keep their input order.
pub fn rank(mut results: Vec<SimulationResult>) -> Vec<SimulationResult> {
    results.sort_by(|a, b| b.expected_return.total_cmp(&a.expected_return));
    results
}

/// First `n` entries of an already ranked sequence.
pub fn top(ranked: &[SimulationResult], n: usize) -> &[SimulationResult] {
    &ranked[..n.min(ranked.len())]
}

#[cfg(test)]
fn result(id: &str, expected_return: f64) -> SimulationResult {
    SimulationResult {
        id: id.to_string(),
        price: expected_return * 100.0,
        delta: 0.5,
        expected_return,
    }
}

#[test]
fn descending_by_expected_return() {
    let ranked = rank(vec![result("a", 0.05), result("b", 0.20), result("c", 0.10)]);
    let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["b", "c", "a"]);
}

#[test]
fn ties_keep_input_order() {
    let ranked = rank(vec![
        result("first", 0.1),
        result("top", 0.3),
        result("second", 0.1),
        result("third", 0.1),
    ]);
    let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["top", "first", "second", "third"]);
}

#[test]
fn top_is_clamped() {
    let ranked = rank(vec![result("a", 0.1), result("b", 0.2)]);
    assert_eq!(top(&ranked, 5).len(), 2);
    assert_eq!(top(&ranked, 1)[0].id, "b");
    assert!(top(&[], 3).is_empty());
}
