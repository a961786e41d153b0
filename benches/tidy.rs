use diol::prelude::*;
use faer::Mat;
use lmtidy::{Augment, Convergence, Data, Glance, Nls, Table, Tidy, TidyOptions};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();
    let mut bench = Bench::new(BenchConfig::from_args()?);
    bench.register_many(
        list![new, tidy, tidy_conf_int, augment, glance],
        [10, 100, 1000, 10000, 100000],
    );
    bench.run()?;
    Ok(())
}

// y = a * exp(-b * x) + e, evaluated at the generating parameters
fn model(nrow: usize) -> (Data, Nls) {
    let (a, b) = (2.5, 0.3);
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let noise = Normal::new(0.0, 0.05).unwrap();
    let xs = (0..nrow).map(|i| i as f64 / 10.0).collect::<Vec<_>>();
    let fitted = xs.iter().map(|x| a * (-b * x).exp()).collect::<Vec<_>>();
    let ys = fitted
        .iter()
        .map(|f| f + noise.sample(&mut rng))
        .collect::<Vec<_>>();
    let residuals = ys.iter().zip(fitted.iter()).map(|(y, f)| y - f).collect();
    let jacobian = Mat::from_fn(nrow, 2, |i, j| {
        let e = (-b * xs[i]).exp();
        if j == 0 {
            e
        } else {
            -a * xs[i] * e
        }
    });
    let nls = Nls::new(
        &["a", "b"],
        &[a, b],
        jacobian.as_ref(),
        fitted,
        residuals,
        Convergence::new(true, 1e-8, 5, "converged"),
    )
    .unwrap();
    let data = Data::new(Table::from_columns([("x", xs), ("y", ys)]).unwrap());
    (data, nls)
}

fn new(bencher: Bencher, nrow: usize) {
    bencher.bench(|| {
        model(nrow);
    });
}

fn tidy(bencher: Bencher, nrow: usize) {
    let (_, nls) = model(nrow);
    let options = TidyOptions::default();
    bencher.bench(|| {
        nls.tidy(&options).unwrap();
    });
}

fn tidy_conf_int(bencher: Bencher, nrow: usize) {
    let (_, nls) = model(nrow);
    let options = TidyOptions::new().conf_int(true);
    bencher.bench(|| {
        nls.tidy(&options).unwrap();
    });
}

fn augment(bencher: Bencher, nrow: usize) {
    let (data, nls) = model(nrow);
    bencher.bench(|| {
        nls.augment(Some(&data)).unwrap();
    });
}

fn glance(bencher: Bencher, nrow: usize) {
    let (_, nls) = model(nrow);
    bencher.bench(|| {
        nls.glance().unwrap();
    });
}
