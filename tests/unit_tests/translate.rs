use fenris_mms::expression::{
    as_vector, conditional, cos, curl, det, div, dot, exp, ge, grad, gt, inner, ln, lt, ne, outer, shape_of, sin,
    spatial_coordinate, tr, transpose, Constant, Expression, Field,
};
use fenris_mms::compiled::{CompiledExpression, CompiledExpressionBuilder};
use fenris_mms::substitution::Substitutions;
use fenris_mms::symbolic::{t, x, y, z, Bindings, Expr, Symbol};
use fenris_mms::translate::{translate, Translator};
use fenris_mms::{Shape, SymTensor, TranslationError};
use nalgebra::Matrix2;

fn evaluate_at(tensor: &SymTensor, point: &[f64], time: f64) -> Vec<f64> {
    let bindings = Bindings::new(point, time);
    tensor
        .components()
        .iter()
        .map(|c| c.evaluate(&bindings))
        .collect()
}

#[test]
fn fields_are_replaced_by_exact_forms() {
    let v = Field::scalar(1);
    let f = 3.0 * x() + t();
    let substitutions = Substitutions::new().with(&v, f.clone());
    let translated = translate(&v.expr(), &substitutions, 1).unwrap();
    assert_eq!(translated, SymTensor::scalar(f));
}

#[test]
fn scalar_manufactured_expression() {
    let v = Field::scalar(1);
    let substitutions = Substitutions::new().with(&v, 3.0 * x() + t());
    let e = v.expr() - 3.0 * v.expr().pow(2.0) + cos(&v) * v.expr().dx(0);
    let translated = translate(&e, &substitutions, 1).unwrap();

    for &px in &[0.0, 0.3, 1.0] {
        let f: f64 = 3.0 * px + 2.0;
        let expected = f - 3.0 * f * f + f.cos() * 3.0;
        util::assert_slices_approx_eq!(&evaluate_at(&translated, &[px], 2.0), &[expected], abstol = 1e-12);
    }
}

#[test]
fn constants_translate_to_their_values() {
    let r = Constant::matrix(Matrix2::new(1.0, 2.0, 3.0, 4.0));
    let c = Constant::scalar(0.5);
    let translated = translate(&(c.expr() * r.expr()), &Substitutions::new(), 2).unwrap();
    assert_eq!(translated, SymTensor::from_values(Shape::matrix(2, 2), &[0.5, 1.0, 1.5, 2.0]));
}

#[test]
fn scalar_constant_substitution_is_ignored() {
    let c = Constant::scalar(2.0);
    let substitutions = Substitutions::new().with(&c, x());
    let translated = translate(&(c.expr() + 1.0), &substitutions, 2).unwrap();
    assert_eq!(translated.as_scalar().and_then(Expr::as_number), Some(3.0));
}

#[test]
fn matrix_vector_contraction() {
    let u = Field::vector(2);
    let r = Constant::matrix(Matrix2::new(1.0, 2.0, 3.0, 4.0));
    let g = SymTensor::vector([x().powi(2), x() * y()]);
    let substitutions = Substitutions::new().with(&u, g);

    let translated = translate(&dot(&r, &u), &substitutions, 2).unwrap();
    assert_eq!(translated.shape(), &Shape::vector(2));
    let (px, py) = (0.5, 2.0);
    let (g0, g1) = (px * px, px * py);
    util::assert_slices_approx_eq!(
        &evaluate_at(&translated, &[px, py], 0.0),
        &[g0 + 2.0 * g1, 3.0 * g0 + 4.0 * g1],
        abstol = 1e-14
    );
}

#[test]
fn unknown_field_fails() {
    let u = Field::scalar(2);
    let v = Field::scalar(2);
    let substitutions = Substitutions::new().with(&u, x());
    let result = translate(&(u.expr() + v.expr()), &substitutions, 2);
    assert_eq!(result, Err(TranslationError::UnknownField(v.id())));
}

#[test]
fn invalid_substitutions_fail_before_translation() {
    let u = Field::vector(2);
    let substitutions = Substitutions::new().with(&u, x());
    assert!(matches!(
        translate(&u.expr(), &substitutions, 2),
        Err(TranslationError::Validation(_))
    ));
}

#[test]
fn shape_errors_abort_translation() {
    let u = Field::vector(2);
    let v = Field::scalar(2);
    let substitutions = Substitutions::new()
        .with(&u, SymTensor::vector([x(), y()]))
        .with(&v, x());
    assert!(matches!(
        translate(&(u.expr() + v.expr()), &substitutions, 2),
        Err(TranslationError::Shape(_))
    ));
    assert!(matches!(
        translate(&inner(&u, &v), &substitutions, 2),
        Err(TranslationError::Shape(_))
    ));
    assert!(matches!(
        translate(&det(&u), &substitutions, 2),
        Err(TranslationError::Shape(_))
    ));
}

#[test]
fn curl_fails_in_one_dimension() {
    let u = Field::scalar(1);
    let substitutions = Substitutions::new().with(&u, x().powi(2));
    assert_eq!(
        translate(&curl(&u), &substitutions, 1),
        Err(TranslationError::Dimension {
            operator: "curl",
            geometric_dim: 1
        })
    );
}

#[test]
fn invalid_geometric_dimension_fails() {
    let e = Expression::literal(1.0);
    assert!(matches!(
        translate(&e, &Substitutions::new(), 4),
        Err(TranslationError::Dimension { geometric_dim: 4, .. })
    ));
    assert!(matches!(
        translate(&e, &Substitutions::new(), 0),
        Err(TranslationError::Dimension { geometric_dim: 0, .. })
    ));
}

#[test]
fn spatial_coordinate_translates_to_symbols() {
    let translated = translate(&spatial_coordinate(), &Substitutions::new(), 3).unwrap();
    assert_eq!(translated, SymTensor::vector([x(), y(), z()]));

    let xs = spatial_coordinate();
    let rotated = as_vector([-xs.index(1).pow(2.0), xs.index(0).pow(2.0)]);
    let translated = translate(&curl(&rotated), &Substitutions::new(), 2).unwrap();
    // 2x + 2y
    util::assert_slices_approx_eq!(&evaluate_at(&translated, &[1.0, 3.0], 0.0), &[8.0], abstol = 1e-14);
}

#[test]
fn conditionals_stay_piecewise() {
    let u = Field::scalar(2);
    let substitutions = Substitutions::new().with(&u, x() + y());
    let e = conditional(ge(&u, 1.0).and(lt(&u, 2.0)), 2.0 * u.expr(), sin(&u));
    let translated = translate(&e, &substitutions, 2).unwrap();

    // The predicate is not decided during translation
    assert!(translated.depends_on(Symbol::X));
    let at = |px: f64, py: f64| evaluate_at(&translated, &[px, py], 0.0)[0];
    assert_eq!(at(0.5, 1.0), 3.0);
    assert_eq!(at(0.25, 0.25), 0.5_f64.sin());
    assert_eq!(at(1.5, 1.0), 2.5_f64.sin());

    let negated = conditional(!gt(&u, 1.0).or(ne(&u, 3.0)), 1.0, 0.0);
    let translated = translate(&negated, &substitutions, 2).unwrap();
    assert_eq!(evaluate_at(&translated, &[1.0, 2.0], 0.0), vec![0.0]);
}

#[test]
fn translated_shapes_match_expression_shapes() {
    let u = Field::scalar(3);
    let v = Field::vector(3);
    let m = Field::tensor(3);
    let substitutions = Substitutions::new()
        .with(&u, x() * y() * z() + t())
        .with(&v, SymTensor::vector([x().sin(), y() * z(), t() * x()]))
        .with(
            &m,
            SymTensor::matrix([
                [x(), y(), z()],
                [y() * z(), x().powi(2), Expr::one()],
                [t(), z().exp(), x() * y()],
            ]),
        );

    let expressions = vec![
        grad(&u),
        grad(&v),
        grad(&m),
        div(&v),
        div(&m),
        div(grad(&v)),
        curl(&v),
        curl(&u),
        dot(&m, &v),
        dot(&v, &m),
        dot(&m, &m),
        inner(&m, &grad(&v)),
        outer(&v, &grad(&u)),
        transpose(&m),
        tr(&m),
        det(&m),
        exp(&m),
        m.expr().index(2),
        v.expr().index(0).dx(2),
        u.expr() / (1.0 + u.expr().pow(2.0)),
        conditional(gt(&u, 0.0), &v, -v.expr()),
    ];

    for e in expressions {
        let translated = translate(&e, &substitutions, 3).unwrap();
        assert_eq!(translated.shape(), &shape_of(&e, 3).unwrap());
    }
}

#[test]
fn translation_is_deterministic() {
    let v = Field::vector(2);
    let substitutions = Substitutions::new().with(&v, SymTensor::vector([x() * t(), y().cos()]));
    let e = inner(grad(&v), grad(&v)) + det(grad(&v));
    let first = translate(&e, &substitutions, 2).unwrap();
    let second = translate(&e, &substitutions, 2).unwrap();
    assert_eq!(first, second);
}

#[test]
fn shared_nodes_are_translated_once() {
    let v = Field::vector(2);
    let substitutions = Substitutions::new().with(&v, SymTensor::vector([x(), y()]));
    let shared = grad(&v);
    let e = dot(&shared, &shared) + &shared;

    let mut translator = Translator::new(2, &substitutions);
    let first = translator.translate(&e).unwrap();
    let again = translator.translate(&shared).unwrap();
    assert_eq!(again, SymTensor::from_values(Shape::matrix(2, 2), &[1.0, 0.0, 0.0, 1.0]));
    // grad(v).grad(v) + grad(v) = 2I
    assert_eq!(first, SymTensor::from_values(Shape::matrix(2, 2), &[2.0, 0.0, 0.0, 2.0]));
    assert_eq!(translator.geometric_dim(), 2);
}

#[test]
fn repeated_squaring_translates_compactly() {
    let v = Field::scalar(1);
    let substitutions = Substitutions::new().with(&v, x() + 2.0);
    let mut e = v.expr();
    for _ in 0..40 {
        e = &e * &e;
    }

    let translated = translate(&e, &substitutions, 1).unwrap();
    let component = translated.as_scalar().unwrap();
    assert_eq!(component, &(x() + 2.0).pow(2.0_f64.powi(40)));
    assert_eq!(component.num_distinct_nodes(), 5);
    assert_eq!(evaluate_at(&translated, &[-1.0], 0.0), vec![1.0]);

    let compiled = CompiledExpression::from_exact(translated, 1, 1).unwrap();
    assert_eq!(compiled.programs()[0].instructions().len(), 5);
    assert_eq!(compiled.evaluate(&[-1.0]).as_scalar(), Some(1.0));
}

#[test]
fn deep_shared_expression_translates_and_compiles() {
    let v = Field::scalar(1);
    let substitutions = Substitutions::new().with(&v, x() + 2.0);
    let mut e = v.expr();
    for _ in 0..30 {
        e = &e + sin(&e);
    }

    let compiled = CompiledExpressionBuilder::new(1)
        .build(&e, &substitutions)
        .unwrap();
    let num_instructions = compiled.programs()[0].instructions().len();
    assert!(num_instructions < 30 * 30 * 4, "{} instructions", num_instructions);

    let mut expected = 0.5 + 2.0;
    for _ in 0..30 {
        expected += f64::sin(expected);
    }
    let value = compiled.evaluate(&[0.5]).as_scalar().unwrap();
    assert!((value - expected).abs() <= 1e-12 * expected.abs(), "{} != {}", value, expected);

    // The derivative shares its subexpressions too
    let derivative = CompiledExpressionBuilder::new(1)
        .build(&e.dx(0), &substitutions)
        .unwrap();
    assert!(derivative.programs()[0].instructions().len() < 30 * 30 * 16);
    assert!(derivative.evaluate(&[0.5]).as_scalar().unwrap().is_finite());
}

#[test]
fn zero_factor_annihilates_undefined_factors() {
    // ln(v) is undefined everywhere, but 0 * ln(v) still translates to zero
    let v = Field::scalar(1);
    let substitutions = Substitutions::new().with(&v, -1.0 - x().powi(2));
    let translated = translate(&(0.0 * ln(&v)), &substitutions, 1).unwrap();
    assert_eq!(translated, SymTensor::scalar(Expr::zero()));
}
