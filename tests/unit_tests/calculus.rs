use fenris_mms::calculus::{
    curl, determinant, div, dot, grad, inner, outer, partial_derivative, piecewise, product, trace, transpose,
};
use fenris_mms::symbolic::{t, x, y, z, Bindings, Expr, Predicate};
use fenris_mms::{Shape, SymTensor, TranslationError};
use matrixcompare::assert_scalar_eq;
use paste::paste;

fn evaluate(tensor: &SymTensor, point: &[f64]) -> Vec<f64> {
    let bindings = Bindings::new(point, 0.0);
    tensor
        .components()
        .iter()
        .map(|c| c.evaluate(&bindings))
        .collect()
}

#[test]
fn grad_of_scalar_and_vector() {
    let u = SymTensor::scalar(x().powi(2) * y());
    let grad_u = grad(&u, 2);
    assert_eq!(grad_u.shape(), &Shape::vector(2));
    util::assert_slices_approx_eq!(&evaluate(&grad_u, &[2.0, 3.0]), &[12.0, 4.0], abstol = 1e-14);

    let v = SymTensor::vector([x() * y(), y().powi(3)]);
    let grad_v = grad(&v, 2);
    assert_eq!(grad_v.shape(), &Shape::matrix(2, 2));
    // Row i is the gradient of component i
    util::assert_slices_approx_eq!(&evaluate(&grad_v, &[2.0, 3.0]), &[3.0, 2.0, 0.0, 27.0], abstol = 1e-14);
}

#[test]
fn grad_does_not_differentiate_time() {
    let u = SymTensor::scalar(t() * x());
    let grad_u = grad(&u, 3);
    assert_eq!(grad_u.shape(), &Shape::vector(3));
    assert_eq!(grad_u.get(&[0]), &t());
    assert!(grad_u.get(&[1]).is_zero());
    assert!(grad_u.get(&[2]).is_zero());
}

#[test]
fn div_of_vector_and_matrix() {
    let v = SymTensor::vector([x().powi(2), x() * y()]);
    let div_v = div(&v, 2).unwrap();
    assert_eq!(div_v.shape(), &Shape::scalar());
    // 2x + x
    util::assert_slices_approx_eq!(&evaluate(&div_v, &[2.0, 5.0]), &[6.0], abstol = 1e-14);

    let m = SymTensor::matrix([[x() * y(), y()], [x().powi(2), y().powi(2)]]);
    let div_m = div(&m, 2).unwrap();
    assert_eq!(div_m.shape(), &Shape::vector(2));
    // (y + 1, 2x + 2y)
    util::assert_slices_approx_eq!(&evaluate(&div_m, &[2.0, 5.0]), &[6.0, 14.0], abstol = 1e-14);

    assert!(div(&SymTensor::scalar(x()), 2).is_err());
    assert!(div(&SymTensor::vector([x(), y(), z()]), 2).is_err());
}

#[test]
fn div_of_grad_is_laplacian() {
    let u = SymTensor::scalar(x().powi(2) * y() + y().powi(3) * z());
    let laplacian = div(&grad(&u, 3), 3).unwrap();
    // 2y + 6yz
    util::assert_slices_approx_eq!(&evaluate(&laplacian, &[1.0, 2.0, 3.0]), &[40.0], abstol = 1e-13);
}

#[test]
fn curl_in_two_dimensions() {
    // Rotated gradient of a scalar
    let u = SymTensor::scalar(x().powi(2) * y());
    let curl_u = curl(&u, 2).unwrap();
    assert_eq!(curl_u.shape(), &Shape::vector(2));
    util::assert_slices_approx_eq!(&evaluate(&curl_u, &[2.0, 3.0]), &[4.0, -12.0], abstol = 1e-14);

    // Scalar curl of a vector
    let v = SymTensor::vector([-y().powi(2), x().powi(2)]);
    let curl_v = curl(&v, 2).unwrap();
    assert_eq!(curl_v.shape(), &Shape::scalar());
    util::assert_slices_approx_eq!(&evaluate(&curl_v, &[2.0, 3.0]), &[10.0], abstol = 1e-14);
}

#[test]
fn curl_in_three_dimensions() {
    let v = SymTensor::vector([y() * z(), x().powi(2), x() * y() * z()]);
    let curl_v = curl(&v, 3).unwrap();
    assert_eq!(curl_v.shape(), &Shape::vector(3));
    // (xz - 0, y - yz, 2x - z)
    util::assert_slices_approx_eq!(&evaluate(&curl_v, &[1.0, 2.0, 3.0]), &[3.0, -4.0, -1.0], abstol = 1e-14);

    // The curl of a scalar is still the 2D rotated gradient
    let curl_u = curl(&SymTensor::scalar(x() * y()), 3).unwrap();
    assert_eq!(curl_u.shape(), &Shape::vector(2));
}

#[test]
fn curl_of_a_curl_free_field_vanishes() {
    let u = SymTensor::scalar(x().sin() * y() * z().exp());
    let curl_grad = curl(&grad(&u, 3), 3).unwrap();
    util::assert_slices_approx_eq!(&evaluate(&curl_grad, &[0.3, -0.4, 0.5]), &[0.0; 3], abstol = 1e-14);
}

macro_rules! curl_dimension_error_test {
    ($dim:literal) => {
        paste! {
            #[test]
            fn [<curl_fails_in_ $dim d>]() {
                let v = SymTensor::vector([x(), x()]);
                assert!(matches!(
                    curl(&v, $dim),
                    Err(TranslationError::Dimension {
                        operator: "curl",
                        geometric_dim: $dim
                    })
                ));
            }
        }
    };
}

curl_dimension_error_test!(0);
curl_dimension_error_test!(1);
curl_dimension_error_test!(4);

#[test]
fn curl_rejects_unsupported_shapes() {
    assert!(matches!(
        curl(&SymTensor::vector([x(), y(), z()]), 2),
        Err(TranslationError::Shape(_))
    ));
    assert!(matches!(
        curl(&SymTensor::zeros(Shape::matrix(2, 2)), 2),
        Err(TranslationError::Shape(_))
    ));
}

#[test]
fn dot_contractions() {
    let r = SymTensor::from_values(Shape::matrix(2, 2), &[1.0, 2.0, 3.0, 4.0]);
    let g = SymTensor::vector([x(), y()]);

    let rg = dot(&r, &g).unwrap();
    assert_eq!(rg.shape(), &Shape::vector(2));
    util::assert_slices_approx_eq!(&evaluate(&rg, &[5.0, 7.0]), &[19.0, 43.0], abstol = 1e-14);

    let gr = dot(&g, &r).unwrap();
    util::assert_slices_approx_eq!(&evaluate(&gr, &[5.0, 7.0]), &[26.0, 38.0], abstol = 1e-14);

    let rr = dot(&r, &r).unwrap();
    assert_eq!(rr.shape(), &Shape::matrix(2, 2));
    util::assert_slices_approx_eq!(&evaluate(&rr, &[]), &[7.0, 10.0, 15.0, 22.0], abstol = 1e-14);

    let gg = dot(&g, &g).unwrap();
    assert_eq!(gg.shape(), &Shape::scalar());
    util::assert_slices_approx_eq!(&evaluate(&gg, &[5.0, 7.0]), &[74.0], abstol = 1e-14);

    let scalars = dot(&SymTensor::scalar(x()), &SymTensor::scalar(y())).unwrap();
    assert_eq!(scalars.as_scalar(), Some(&(x() * y())));

    assert!(dot(&r, &SymTensor::vector([x(), y(), z()])).is_err());
}

#[test]
fn inner_and_outer_products() {
    let a = SymTensor::vector([x(), y()]);
    let b = SymTensor::from_values(Shape::vector(2), &[2.0, 3.0]);

    let ab = inner(&a, &b).unwrap();
    util::assert_slices_approx_eq!(&evaluate(&ab, &[1.0, 1.0]), &[5.0], abstol = 1e-14);
    assert!(inner(&a, &SymTensor::scalar(x())).is_err());

    let m = SymTensor::from_values(Shape::matrix(2, 2), &[1.0, 2.0, 3.0, 4.0]);
    let mm = inner(&m, &m).unwrap();
    assert_eq!(mm.as_scalar().and_then(Expr::as_number), Some(30.0));

    let outer_ab = outer(&a, &b);
    assert_eq!(outer_ab.shape(), &Shape::matrix(2, 2));
    util::assert_slices_approx_eq!(&evaluate(&outer_ab, &[1.0, 10.0]), &[2.0, 3.0, 20.0, 30.0], abstol = 1e-14);

    let outer_am = outer(&a, &m);
    assert_eq!(outer_am.shape(), &Shape::from_dims([2, 2, 2]));
}

#[test]
fn trace_transpose_and_determinant() {
    let m = SymTensor::matrix([[x(), y()], [Expr::number(3.0), x() * y()]]);
    let tr_m = trace(&m).unwrap();
    util::assert_slices_approx_eq!(&evaluate(&tr_m, &[2.0, 5.0]), &[12.0], abstol = 1e-14);

    let m_t = transpose(&m).unwrap();
    assert_eq!(m_t.get(&[0, 1]), &Expr::number(3.0));
    assert_eq!(m_t.get(&[1, 0]), &y());

    let det_m = determinant(&m).unwrap();
    // x^2 y - 3y
    util::assert_slices_approx_eq!(&evaluate(&det_m, &[2.0, 5.0]), &[5.0], abstol = 1e-14);

    assert!(trace(&SymTensor::vector([x(), y()])).is_err());
    assert!(determinant(&SymTensor::from_values(Shape::matrix(2, 3), &[0.0; 6])).is_err());
    assert!(transpose(&SymTensor::vector([x(), y()])).is_err());
    assert_eq!(determinant(&SymTensor::scalar(x())).unwrap(), SymTensor::scalar(x()));
}

#[test]
fn determinant_of_3x3_matches_numerical_determinant() {
    let values = [2.0, -1.0, 0.5, 1.0, 3.0, -2.0, 0.0, 4.0, 1.5];
    let m = SymTensor::from_values(Shape::matrix(3, 3), &values);
    let expected = nalgebra::Matrix3::from_row_slice(&values).determinant();
    let det = determinant(&m).unwrap();
    assert_scalar_eq!(
        det.as_scalar().and_then(Expr::as_number).unwrap(),
        expected,
        comp = abs,
        tol = 1e-12
    );

    let symbolic = SymTensor::from_fn(Shape::matrix(3, 3), |index| {
        Expr::number(values[3 * index[0] + index[1]]) * x()
    });
    let det = determinant(&symbolic).unwrap();
    // det(xA) = x^3 det(A)
    util::assert_slices_approx_eq!(&evaluate(&det, &[2.0]), &[8.0 * expected], abstol = 1e-11);
}

#[test]
fn partial_derivatives_and_products() {
    let v = SymTensor::vector([x() * y(), y().powi(2)]);
    let dv_dy = partial_derivative(&v, 1);
    util::assert_slices_approx_eq!(&evaluate(&dv_dy, &[3.0, 2.0]), &[3.0, 4.0], abstol = 1e-14);

    let scaled = product(&SymTensor::scalar(2.0), &v).unwrap();
    util::assert_slices_approx_eq!(&evaluate(&scaled, &[3.0, 2.0]), &[12.0, 8.0], abstol = 1e-14);
    let scaled = product(&v, &SymTensor::scalar(x())).unwrap();
    util::assert_slices_approx_eq!(&evaluate(&scaled, &[3.0, 2.0]), &[18.0, 12.0], abstol = 1e-14);
    assert!(product(&v, &v).is_err());
}

#[test]
fn piecewise_is_componentwise() {
    let then = SymTensor::vector([x(), y()]);
    let otherwise = SymTensor::vector([y(), x()]);
    let selected = piecewise(&Predicate::gt(x(), y()), &then, &otherwise).unwrap();
    util::assert_slices_approx_eq!(&evaluate(&selected, &[2.0, 1.0]), &[2.0, 1.0], abstol = 0.0);
    util::assert_slices_approx_eq!(&evaluate(&selected, &[1.0, 2.0]), &[2.0, 1.0], abstol = 0.0);

    assert!(piecewise(&Predicate::gt(x(), y()), &then, &SymTensor::scalar(x())).is_err());
}
