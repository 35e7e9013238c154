use fenris_mms::compiled::{compile, CompiledExpression, CompiledExpressionBuilder};
use fenris_mms::expression::{conditional, dot, ge, grad, sqrt, Constant, Field};
use fenris_mms::proptest as strategies;
use fenris_mms::substitution::Substitutions;
use fenris_mms::symbolic::{t, x, y, Expr};
use fenris_mms::{Shape, SymTensor, TranslationError, Value};
use nalgebra::Matrix2;
use proptest::prelude::*;

#[test]
fn time_is_mutable_without_recompilation() {
    let mut compiled = CompiledExpression::from_exact(3.0 * x() + t(), 1, 1).unwrap();
    assert_eq!(compiled.time(), 0.0);
    assert!(compiled.is_time_dependent());
    let programs_before = compiled.programs().to_vec();

    assert_eq!(compiled.evaluate(&[1.0]).as_scalar(), Some(3.0));
    compiled.set_time(2.0);
    assert_eq!(compiled.evaluate(&[1.0]).as_scalar(), Some(5.0));
    compiled.set_time(-1.0);
    assert_eq!(compiled.evaluate(&[1.0]).as_scalar(), Some(2.0));
    assert_eq!(compiled.programs(), programs_before.as_slice());
}

#[test]
fn degree_is_advisory() {
    let form = x().sin() * y() + t();
    let compiled = CompiledExpression::from_exact(form.clone(), 2, 1)
        .unwrap()
        .with_time(0.5);
    let regraded = CompiledExpressionBuilder::new(2)
        .with_degree(7)
        .with_time(0.5)
        .build_exact(form)
        .unwrap();
    assert_eq!(compiled.degree(), 1);
    assert_eq!(regraded.degree(), 7);
    assert_eq!(compiled.evaluate(&[0.3, 0.4]), regraded.evaluate(&[0.3, 0.4]));
}

#[test]
fn builder_validates_translates_and_compiles() {
    let u = Field::vector(2);
    let r = Constant::matrix(Matrix2::new(1.0, 2.0, 3.0, 4.0));
    let substitutions = Substitutions::new().with(&u, SymTensor::vector([x() * t(), y()]));

    let compiled = CompiledExpressionBuilder::new(2)
        .with_degree(2)
        .with_time(3.0)
        .build(&dot(&r, &u), &substitutions)
        .unwrap();
    assert_eq!(compiled.degree(), 2);
    assert_eq!(compiled.time(), 3.0);
    assert_eq!(compiled.shape(), &Shape::vector(2));
    assert_eq!(compiled.geometric_dim(), 2);
    // (3x + 2y, 9x + 4y) at (1, 1)
    assert_eq!(compiled.evaluate(&[1.0, 1.0]), Value::new(Shape::vector(2), vec![5.0, 13.0]));

    let invalid = Substitutions::new().with(&r, x());
    assert!(matches!(
        CompiledExpressionBuilder::new(2).build(&dot(&r, &u), &invalid),
        Err(TranslationError::Validation(_))
    ));
}

#[test]
fn matrix_values_are_row_major() {
    let v = Field::vector(2);
    let substitutions = Substitutions::new().with(&v, SymTensor::vector([x() * y(), y()]));
    let compiled = compile(&grad(&v), &substitutions, 2, 1).unwrap();
    let value = compiled.evaluate(&[2.0, 3.0]);
    assert_eq!(value.shape(), &Shape::matrix(2, 2));
    assert_eq!(value.as_slice(), &[3.0, 2.0, 0.0, 1.0]);
    assert_eq!(value.to_matrix().unwrap(), nalgebra::dmatrix![3.0, 2.0; 0.0, 1.0]);
}

#[test]
fn conditional_branches_are_selected_per_point() {
    let u = Field::scalar(1);
    let substitutions = Substitutions::new().with(&u, x() - 0.5);
    // The square root of the untaken branch is never evaluated for negative arguments
    let e = conditional(ge(&u, 0.0), sqrt(&u), -u.expr());
    let compiled = compile(&e, &substitutions, 1, 1).unwrap();
    assert_eq!(compiled.evaluate(&[0.75]).as_scalar(), Some(0.5));
    assert_eq!(compiled.evaluate(&[0.25]).as_scalar(), Some(0.25));
}

#[test]
fn from_exact_rejects_coordinates_beyond_dimension() {
    assert!(matches!(
        CompiledExpression::from_exact(y(), 1, 1),
        Err(TranslationError::Dimension { geometric_dim: 1, .. })
    ));
    assert!(CompiledExpression::from_exact(y(), 2, 1).is_ok());
    assert!(CompiledExpression::from_exact(Expr::one(), 4, 1).is_err());
}

#[test]
#[should_panic]
fn evaluate_panics_on_wrong_point_length() {
    let compiled = CompiledExpression::from_exact(x(), 2, 1).unwrap();
    compiled.evaluate(&[1.0]);
}

#[test]
#[should_panic]
fn evaluate_into_panics_on_wrong_output_length() {
    let compiled = CompiledExpression::from_exact(SymTensor::vector([x(), y()]), 2, 1).unwrap();
    let mut output = [0.0; 3];
    compiled.evaluate_into(&[1.0, 1.0], &mut output);
}

#[test]
fn parallel_evaluation_matches_sequential_evaluation() {
    let compiled = CompiledExpression::from_exact(SymTensor::vector([x().sin() * y(), x() + t()]), 2, 1)
        .unwrap()
        .with_time(1.5);
    let points: Vec<[f64; 2]> = (0..100)
        .map(|i| [i as f64 / 100.0, 1.0 - i as f64 / 50.0])
        .collect();
    let parallel = compiled.evaluate_at_points_par(&points);
    assert_eq!(parallel.len(), points.len());
    for (point, value) in points.iter().zip(&parallel) {
        assert_eq!(value, &compiled.evaluate(point));
    }
}

#[test]
fn evaluations_serialize_to_json() {
    let compiled = CompiledExpression::from_exact(SymTensor::vector([x(), 2.0 * x()]), 1, 1).unwrap();
    let values = compiled.evaluate_at_points_par(&[[0.5], [1.0]]);
    let json = serde_json::to_string(&values).unwrap();
    assert_eq!(
        json,
        r#"[{"shape":{"dims":[2]},"data":[0.5,1.0]},{"shape":{"dims":[2]},"data":[1.0,2.0]}]"#
    );
}

proptest! {
    #[test]
    fn compiled_and_tree_walking_evaluation_agree(
        form in strategies::polynomial_tensor(Shape::matrix(2, 2), 2, 3),
        point in strategies::point(2),
        time in strategies::time(),
    ) {
        let compiled = CompiledExpression::from_exact(form, 2, 1).unwrap().with_time(time);
        prop_assert_eq!(compiled.evaluate(&point), compiled.evaluate_symbolic(&point));
    }

    #[test]
    fn evaluation_is_independent_of_degree(
        form in strategies::polynomial(3, 4),
        point in strategies::point(3),
        time in strategies::time(),
        degree in 0usize..10,
    ) {
        let compiled = CompiledExpression::from_exact(form.clone(), 3, 1).unwrap().with_time(time);
        let regraded = CompiledExpression::from_exact(form, 3, degree).unwrap().with_time(time);
        prop_assert_eq!(compiled.evaluate(&point), regraded.evaluate(&point));
    }

    #[test]
    fn repeated_translation_evaluates_identically(
        form in strategies::polynomial(2, 3),
        point in strategies::point(2),
        time in strategies::time(),
    ) {
        let u = Field::scalar(2);
        let substitutions = Substitutions::new().with(&u, form);
        let e = dot(grad(&u), grad(&u)) + u.expr();
        let builder = CompiledExpressionBuilder::new(2).with_time(time);
        let first = builder.build(&e, &substitutions).unwrap();
        let second = builder.build(&e, &substitutions).unwrap();
        prop_assert_eq!(first.evaluate(&point), second.evaluate(&point));
    }
}
