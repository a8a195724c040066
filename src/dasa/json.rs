#![allow(non_snake_case)]
use super::blocktree::BlockTree;
use super::driver::ProjectionSolver;
use super::problem::ProjectionProblem;
use super::settings::DasaSettings;
use crate::algebra::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read, Write};

// The problem as provided by the user, with the settings it was solved
// under.  Infinite bounds are stored as ±MAX since JSON has no infinity.
#[derive(Serialize, Deserialize)]
#[serde(bound = "T: Serialize + DeserializeOwned")]
struct JsonProblemData<T: FloatT> {
    pub A: CscMatrix<T>,
    pub bl: Vec<T>,
    pub bu: Vec<T>,
    pub lo: Vec<T>,
    pub hi: Vec<T>,
    pub y: Vec<T>,
    pub tree: BlockTree,
    pub settings: DasaSettings<T>,
}

impl<T> ProjectionSolver<T>
where
    T: FloatT + DeserializeOwned + Serialize,
{
    /// Write the problem data and settings to a file as JSON.
    pub fn save_to_file(&self, file: &mut File) -> Result<(), io::Error> {
        let prob = self.context().problem();
        let mut json_data = JsonProblemData {
            A: prob.A.clone(),
            bl: prob.bl.clone(),
            bu: prob.bu.clone(),
            lo: prob.lo.clone(),
            hi: prob.hi.clone(),
            y: prob.y.clone(),
            tree: prob.tree.clone(),
            settings: self.context().settings().clone(),
        };
        for v in [
            &mut json_data.bl,
            &mut json_data.bu,
            &mut json_data.lo,
            &mut json_data.hi,
        ] {
            sanitize_infinities(v);
        }

        let json = serde_json::to_string(&json_data)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Read a problem written by [`save_to_file`](ProjectionSolver::save_to_file)
    /// and build a fresh solver for it, optionally with new settings.
    pub fn load_from_file(
        file: &mut File,
        settings: Option<DasaSettings<T>>,
    ) -> Result<Self, io::Error> {
        let mut buffer = String::new();
        file.read_to_string(&mut buffer)?;
        let mut json_data: JsonProblemData<T> = serde_json::from_str(&buffer)?;

        for v in [
            &mut json_data.bl,
            &mut json_data.bu,
            &mut json_data.lo,
            &mut json_data.hi,
        ] {
            desanitize_infinities(v);
        }

        let prob = ProjectionProblem::new(
            &json_data.A,
            &json_data.bl,
            &json_data.bu,
            &json_data.lo,
            &json_data.hi,
            &json_data.y,
        )
        .and_then(|p| p.with_block_tree(json_data.tree))
        .map_err(invalid_data)?;

        let settings = settings.unwrap_or(json_data.settings);
        Self::new(prob, settings).map_err(invalid_data)
    }
}

fn sanitize_infinities<T: FloatT>(v: &mut [T]) {
    for x in v.iter_mut() {
        if *x == T::infinity() {
            *x = T::max_value();
        } else if *x == T::neg_infinity() {
            *x = T::min_value();
        }
    }
}

fn desanitize_infinities<T: FloatT>(v: &mut [T]) {
    for x in v.iter_mut() {
        if *x == T::max_value() {
            *x = T::infinity();
        } else if *x == T::min_value() {
            *x = T::neg_infinity();
        }
    }
}

fn invalid_data<E: std::error::Error + Send + Sync + 'static>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

#[test]
fn test_infinity_sanitizing() {
    let mut v = vec![f64::NEG_INFINITY, -1., 0., f64::INFINITY];
    sanitize_infinities(&mut v);
    assert!(v.iter().all(|x| x.is_finite()));
    desanitize_infinities(&mut v);
    assert_eq!(v, vec![f64::NEG_INFINITY, -1., 0., f64::INFINITY]);
}
