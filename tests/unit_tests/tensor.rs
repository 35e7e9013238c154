use fenris_mms::symbolic::{x, y, Expr, Symbol};
use fenris_mms::{Shape, SymTensor, Value};
use matrixcompare::assert_matrix_eq;
use nalgebra::{dmatrix, dvector};

#[test]
fn sym_tensor_construction() {
    let v = SymTensor::vector([x(), y()]);
    assert_eq!(v.shape(), &Shape::vector(2));
    assert_eq!(v.get(&[1]), &y());

    let m = SymTensor::matrix([[x(), Expr::one()], [Expr::zero(), y()]]);
    assert_eq!(m.shape(), &Shape::matrix(2, 2));
    assert_eq!(m.get(&[0, 1]), &Expr::one());
    assert_eq!(m.get(&[1, 1]), &y());
    assert!(m.as_scalar().is_none());

    let s = SymTensor::from(x());
    assert_eq!(s.as_scalar(), Some(&x()));

    let indexed = SymTensor::from_fn(Shape::matrix(2, 3), |index| Expr::number((10 * index[0] + index[1]) as f64));
    let values: Vec<_> = indexed.components().iter().map(|c| c.as_number().unwrap()).collect();
    assert_eq!(values, vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
}

#[test]
#[should_panic]
fn sym_tensor_rejects_ragged_rows() {
    SymTensor::matrix(vec![vec![x(), y()], vec![x()]]);
}

#[test]
fn sym_tensor_symbols_and_display() {
    let m = SymTensor::matrix([[x(), Expr::one()], [Expr::zero(), 2.0 * y()]]);
    assert!(m.depends_on(Symbol::Y));
    assert!(!m.depends_on(Symbol::T));
    assert_eq!(m.free_symbols().len(), 2);
    insta::assert_snapshot!(format!("{}", m), @"[[x, 1], [0, 2*y]]");

    let doubled = m.map(|c| 2.0 * c);
    assert_eq!(doubled.get(&[0, 0]), &(2.0 * x()));
    let sum = m.zip_map(&doubled, |a, b| a + b);
    assert_eq!(sum.get(&[0, 1]).as_number(), Some(3.0));
}

#[test]
fn value_converts_to_nalgebra_types() {
    let matrix = dmatrix![1.0, 2.0, 3.0;
                          4.0, 5.0, 6.0];
    let value = Value::from_matrix(&matrix);
    assert_eq!(value.shape(), &Shape::matrix(2, 3));
    // Row-major storage
    assert_eq!(value.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(value.get(&[1, 0]), 4.0);
    assert_matrix_eq!(value.to_matrix().unwrap(), matrix);
    assert!(value.to_vector().is_none());
    assert!(value.as_scalar().is_none());

    let vector = dvector![3.0, 4.0];
    let value = Value::from_vector(&vector);
    assert_matrix_eq!(value.to_vector().unwrap(), vector);
    assert_eq!(value.norm(), 5.0);

    assert_eq!(Value::scalar(2.5).as_scalar(), Some(2.5));
}

#[test]
fn value_serializes_to_json() {
    let value = Value::new(Shape::vector(2), vec![1.5, -2.0]);
    let json = serde_json::to_string(&value).unwrap();
    assert_eq!(json, r#"{"shape":{"dims":[2]},"data":[1.5,-2.0]}"#);
    let deserialized: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, value);
}
