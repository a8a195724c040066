//! __dasa__ is a dual active set engine for the Euclidean projection of a
//! point onto a polyhedron:
//!
//! $$
//! \begin{array}{rl}
//! \text{minimize} & \frac{1}{2}\|x - y\|^2 \\\\\[2ex\]
//!  \text{subject to} & b_l \le Ax \le b_u \\\\\[1ex\]
//!         & l \le x \le h
//!  \end{array}
//! $$
//!
//! with $A \in \mathbb{R}^{m \times n}$ sparse and bounds that may be
//! infinite.  Rows with $b_l = b_u$ are equality constraints.
//!
//! The engine maximizes the dual over a working set of active rows and
//! bound columns.  Each step solves a system with $A_F A_F^\top + \sigma I$,
//! where $F$ is the set of free columns, using a sparse $LDL^\top$ factor
//! that is updated in place as the working set changes.  An optional
//! multilevel block decomposition of the rows and columns lets independent
//! parts of the problem converge separately before their separators.
//!
//! ## Example
//!
//! ```
//! use dasa::{algebra::*, dasa::*};
//!
//! // project y = (3, 1) onto { x ≥ 0 : x₁ + x₂ = 1 }
//! let A = CscMatrix::new(1, 2, vec![0, 1, 2], vec![0, 0], vec![1., 1.]);
//! let inf = f64::INFINITY;
//! let prob = ProjectionProblem::new(&A, &[1.], &[1.], &[0., 0.], &[inf, inf], &[3., 1.]).unwrap();
//!
//! let mut solver = ProjectionSolver::new(prob, DasaSettings::default()).unwrap();
//! assert_eq!(solver.solve(), DasaStatus::SolutionFound);
//! assert!((solver.solution().x[0] - 1.).abs() < 1e-6);
//! ```
//!
//! # License
//!
//! Licensed under Apache License, Version 2.0.

pub mod algebra;
pub mod dasa;
pub mod factor;
pub mod io;
pub mod timers;
