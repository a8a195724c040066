#![allow(non_snake_case)]

#[cfg(feature = "serde")]
#[test]
fn test_json_io() {
    use dasa::{algebra::*, dasa::*};
    use std::io::{Seek, SeekFrom};

    let inf = f64::INFINITY;
    let A = CscMatrix {
        m: 1,
        n: 2,
        colptr: vec![0, 1, 2],
        rowval: vec![0, 0],
        nzval: vec![1.0, 1.0],
    };
    let prob =
        ProjectionProblem::new(&A, &[1.], &[inf], &[0., 0.], &[inf, inf], &[-1., 0.5]).unwrap();
    let settings = DasaSettingsBuilder::default().build().unwrap();

    let mut solver = ProjectionSolver::<f64>::new(prob, settings).unwrap();
    solver.solve();

    // write the problem to a file
    let mut file = tempfile::tempfile().unwrap();
    solver.save_to_file(&mut file).unwrap();

    // read the problem from the file
    file.seek(SeekFrom::Start(0)).unwrap();
    let mut solver2 = ProjectionSolver::<f64>::load_from_file(&mut file, None).unwrap();
    assert_eq!(solver2.context().problem().bu, vec![inf]);
    solver2.solve();
    assert_eq!(solver.solution().x, solver2.solution().x);

    // read the problem from the file with custom settings
    file.seek(SeekFrom::Start(0)).unwrap();
    let settings = DasaSettingsBuilder::default()
        .max_outer_iter(1)
        .build()
        .unwrap();
    let mut solver3 = ProjectionSolver::<f64>::load_from_file(&mut file, Some(settings)).unwrap();
    solver3.solve();
    assert_eq!(solver3.solution().status, DasaStatus::MaxIterations);
}
