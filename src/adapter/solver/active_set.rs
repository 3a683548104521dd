//! Primal active-set method for diagonal quadratic programs.
//!
//! HiGHS is reached through `good_lp`, which only exposes linear
//! objectives. Quadratic programs with a diagonal positive-definite term are
//! therefore refined here, starting from a feasible point supplied by the
//! LP backend.
//!
//! With `y_i = sqrt(q_i) x_i` the objective `sum q_i x_i^2 + c_i x_i` becomes
//! `|y - t|^2` up to a constant, so every problem reduces to projecting the
//! target `t` onto a polyhedron. Each iteration solves the equality-constrained
//! projection on the current working set, steps as far as feasibility allows
//! and either adds the blocking row or drops the row with the most negative
//! multiplier.

use crate::domain::constraint::ConstraintSense;
use crate::error::SolverError;
use crate::port::QpProblem;

/// Relative tolerance for step lengths, multipliers and feasibility.
const EPS: f64 = 1e-10;

/// One row `a . y >= b` (or `= b` when `equality`) in scaled coordinates.
#[derive(Debug, Clone)]
struct Row {
    a: Vec<f64>,
    b: f64,
    equality: bool,
}

impl Row {
    fn dot(&self, y: &[f64]) -> f64 {
        self.a.iter().zip(y).map(|(a, v)| a * v).sum()
    }
}

/// Minimize `problem` starting from the feasible point `start`.
///
/// # Errors
///
/// Returns [`SolverError::InvalidProblem`] for non-positive quadratic
/// weights and [`SolverError::Failed`] when the working set degenerates or
/// the iteration budget runs out.
pub(crate) fn minimize(problem: &QpProblem, start: &[f64]) -> Result<Vec<f64>, SolverError> {
    let n = problem.lp.num_vars();
    if problem.quadratic.len() != n || start.len() != n {
        return Err(SolverError::InvalidProblem(
            "quadratic term and start must match the variable count".to_string(),
        ));
    }
    if let Some(i) = problem.quadratic.iter().position(|q| !(*q > 0.0)) {
        return Err(SolverError::InvalidProblem(format!(
            "quadratic weight of variable {i} must be positive"
        )));
    }

    let scale: Vec<f64> = problem.quadratic.iter().map(|q| q.sqrt()).collect();
    let target: Vec<f64> = problem
        .lp
        .objective
        .iter()
        .zip(&scale)
        .map(|(c, s)| -c / (2.0 * s))
        .collect();
    let rows = scaled_rows(problem, &scale);
    let y0: Vec<f64> = start.iter().zip(&scale).map(|(x, s)| x * s).collect();

    let y = project(&target, &rows, y0)?;
    Ok(y.iter().zip(&scale).map(|(v, s)| v / s).collect())
}

/// Rewrite constraints and finite bounds as `>=` / `=` rows over `y`.
fn scaled_rows(problem: &QpProblem, scale: &[f64]) -> Vec<Row> {
    let n = scale.len();
    let mut rows = Vec::new();
    let mut push = |a: Vec<f64>, b: f64, equality: bool| {
        if a.iter().any(|v| *v != 0.0) {
            rows.push(Row { a, b, equality });
        }
    };

    for constraint in &problem.lp.constraints {
        let a: Vec<f64> = constraint
            .coefficients
            .iter()
            .zip(scale)
            .map(|(c, s)| c / s)
            .collect();
        let neg: Vec<f64> = a.iter().map(|v| -v).collect();
        match constraint.sense {
            ConstraintSense::GreaterEqual => push(a, constraint.rhs, false),
            ConstraintSense::LessEqual => push(neg, -constraint.rhs, false),
            ConstraintSense::Equal => push(a, constraint.rhs, true),
            ConstraintSense::Range { upper } if upper == constraint.rhs => {
                push(a, constraint.rhs, true);
            }
            ConstraintSense::Range { upper } => {
                push(a, constraint.rhs, false);
                push(neg, -upper, false);
            }
        }
    }

    for (i, bounds) in problem.lp.bounds.iter().enumerate() {
        let unit = |sign: f64| {
            let mut a = vec![0.0; n];
            a[i] = sign / scale[i];
            a
        };
        match (bounds.lower, bounds.upper) {
            (Some(lo), Some(hi)) if lo == hi => push(unit(1.0), lo, true),
            (lower, upper) => {
                if let Some(lo) = lower {
                    push(unit(1.0), lo, false);
                }
                if let Some(hi) = upper {
                    push(unit(-1.0), -hi, false);
                }
            }
        }
    }

    rows
}

fn project(target: &[f64], rows: &[Row], mut y: Vec<f64>) -> Result<Vec<f64>, SolverError> {
    let magnitude = target
        .iter()
        .chain(y.iter())
        .fold(1.0_f64, |m, v| m.max(v.abs()));
    let tol = EPS * magnitude;

    let mut working: Vec<usize> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        if row.equality && is_independent(rows, &working, &row.a) {
            working.push(i);
        }
    }

    let max_iterations = 50 * (rows.len() + y.len()) + 100;
    for _ in 0..max_iterations {
        let d: Vec<f64> = target.iter().zip(&y).map(|(t, v)| t - v).collect();
        let lambda = working_multipliers(rows, &working, &d)?;

        let mut p = d;
        for (k, &r) in working.iter().enumerate() {
            for (pj, aj) in p.iter_mut().zip(&rows[r].a) {
                *pj -= lambda[k] * aj;
            }
        }

        if p.iter().all(|v| v.abs() <= tol) {
            // KKT multipliers of the inequality rows are -lambda.
            let release = working
                .iter()
                .enumerate()
                .filter(|(_, r)| !rows[**r].equality)
                .map(|(k, _)| (k, -lambda[k]))
                .filter(|(_, mu)| *mu < -tol)
                .min_by(|a, b| a.1.total_cmp(&b.1));
            match release {
                Some((k, _)) => {
                    working.remove(k);
                    continue;
                }
                None => return Ok(y),
            }
        }

        let mut alpha = 1.0;
        let mut blocking = None;
        for (i, row) in rows.iter().enumerate() {
            if row.equality || working.contains(&i) {
                continue;
            }
            let ap = row.dot(&p);
            if ap < -tol {
                let slack = (row.dot(&y) - row.b).max(0.0);
                let step = slack / -ap;
                if step < alpha {
                    alpha = step;
                    blocking = Some(i);
                }
            }
        }

        for (yj, pj) in y.iter_mut().zip(&p) {
            *yj += alpha * pj;
        }
        if let Some(i) = blocking {
            working.push(i);
        }
    }

    Err(SolverError::Failed {
        stage: "quadratic",
        reason: format!("active set did not converge in {max_iterations} iterations"),
    })
}

/// Solve `(A_W A_W^T) lambda = A_W d` for the working rows.
fn working_multipliers(rows: &[Row], working: &[usize], d: &[f64]) -> Result<Vec<f64>, SolverError> {
    if working.is_empty() {
        return Ok(Vec::new());
    }
    let gram = gram_matrix(rows, working);
    let rhs: Vec<f64> = working.iter().map(|r| rows[*r].dot(d)).collect();
    solve_dense(gram, rhs).ok_or_else(|| SolverError::Failed {
        stage: "quadratic",
        reason: "working set became linearly dependent".to_string(),
    })
}

fn gram_matrix(rows: &[Row], working: &[usize]) -> Vec<Vec<f64>> {
    working
        .iter()
        .map(|i| working.iter().map(|j| rows[*i].dot(&rows[*j].a)).collect())
        .collect()
}

/// True when `a` is not (numerically) in the span of the working rows.
fn is_independent(rows: &[Row], working: &[usize], a: &[f64]) -> bool {
    let norm: f64 = a.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm == 0.0 {
        return false;
    }
    if working.is_empty() {
        return true;
    }
    let Some(coeffs) = solve_dense(
        gram_matrix(rows, working),
        working.iter().map(|r| rows[*r].dot(a)).collect(),
    ) else {
        return false;
    };
    let mut residual = a.to_vec();
    for (k, &r) in working.iter().enumerate() {
        for (x, aj) in residual.iter_mut().zip(&rows[r].a) {
            *x -= coeffs[k] * aj;
        }
    }
    let rnorm: f64 = residual.iter().map(|v| v * v).sum::<f64>().sqrt();
    rnorm > 1e-9 * norm
}

/// Gaussian elimination with partial pivoting. `None` when singular.
fn solve_dense(mut m: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    let n = rhs.len();
    let scale = m
        .iter()
        .flat_map(|r| r.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 {
        return None;
    }

    for col in 0..n {
        let pivot = (col..n).max_by(|a, b| m[*a][col].abs().total_cmp(&m[*b][col].abs()))?;
        if m[pivot][col].abs() <= 1e-12 * scale {
            return None;
        }
        m.swap(col, pivot);
        rhs.swap(col, pivot);
        for row in col + 1..n {
            let factor = m[row][col] / m[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                m[row][k] -= factor * m[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| m[row][k] * x[k]).sum();
        x[row] = (rhs[row] - tail) / m[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constraint::{Constraint, VariableBounds};
    use crate::port::LpProblem;

    fn nearest(target: &[f64], constraints: Vec<Constraint>, bounds: Vec<VariableBounds>) -> QpProblem {
        let mut lp = LpProblem::new(target.len());
        lp.constraints = constraints;
        lp.bounds = bounds;
        QpProblem::nearest_point(lp, target)
    }

    #[test]
    fn unconstrained_minimum_is_target() {
        let qp = nearest(&[1.0, 2.0], vec![], vec![VariableBounds::free(); 2]);
        let x = minimize(&qp, &[0.0, 0.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-9);
        assert!((x[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn projects_onto_sum_constraint() {
        // nearest point to (8, 10) with x + y >= 20
        let qp = nearest(
            &[8.0, 10.0],
            vec![Constraint::geq(vec![1.0, 1.0], 20.0)],
            vec![VariableBounds::bounded(8.0, 10.0), VariableBounds::bounded(10.0, 12.0)],
        );
        let x = minimize(&qp, &[10.0, 12.0]).unwrap();
        assert!((x[0] - 9.0).abs() < 1e-9, "{x:?}");
        assert!((x[1] - 11.0).abs() < 1e-9, "{x:?}");
    }

    #[test]
    fn upper_bound_shifts_excess_to_other_variable() {
        // x + y = 10 nearest to (0, 0) but x <= 2
        let qp = nearest(
            &[0.0, 0.0],
            vec![Constraint::eq(vec![1.0, 1.0], 10.0)],
            vec![VariableBounds::bounded(0.0, 2.0), VariableBounds::non_negative()],
        );
        let x = minimize(&qp, &[0.0, 10.0]).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-9, "{x:?}");
        assert!((x[1] - 8.0).abs() < 1e-9, "{x:?}");
    }

    #[test]
    fn range_row_holds_lower_end() {
        let qp = nearest(
            &[0.0, 0.0, 0.0],
            vec![Constraint::range(vec![1.0, 1.0, 1.0], 3.0, 3.5)],
            vec![VariableBounds::free(); 3],
        );
        let x = minimize(&qp, &[3.0, 0.0, 0.5]).unwrap();
        for v in &x {
            assert!((v - 1.0).abs() < 1e-9, "{x:?}");
        }
    }

    #[test]
    fn weighted_quadratic_is_respected() {
        // minimize 4x^2 + y^2 subject to x + y >= 5 -> x = 1, y = 4
        let mut lp = LpProblem::new(2);
        lp.constraints = vec![Constraint::geq(vec![1.0, 1.0], 5.0)];
        lp.bounds = vec![VariableBounds::free(); 2];
        let qp = QpProblem {
            lp,
            quadratic: vec![4.0, 1.0],
            start: None,
        };
        let x = minimize(&qp, &[5.0, 5.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-9, "{x:?}");
        assert!((x[1] - 4.0).abs() < 1e-9, "{x:?}");
    }

    #[test]
    fn rejects_non_positive_weights() {
        let qp = QpProblem {
            lp: LpProblem::new(1),
            quadratic: vec![0.0],
            start: None,
        };
        assert!(matches!(
            minimize(&qp, &[0.0]),
            Err(SolverError::InvalidProblem(_))
        ));
    }
}
