use linfa::ParamGuard;
use linfa_nica::{BioNica, NonnegativePca, OnlineSeparator, Preset, TwoLayerNsm};
use ndarray::{array, Array2, Axis, Zip};
use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
use rand_xoshiro::Xoshiro256Plus;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // RUST_LOG=debug shows the initialisation and stabilizer events
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Shape of the data will be (5000 x 3)
    let (sources, mixtures) = create_data(5000);

    let mut bio_nica = BioNica::params(3, 3)
        .preset(Preset::ThreeDimSynthetic)
        .check()?
        .init();
    let estimates = bio_nica.fit_records(&mixtures)?;
    report("Bio-NICA", &sources, &estimates);

    let mut nsm = TwoLayerNsm::params(3, 3)
        .preset(Preset::ThreeDimSynthetic)
        .check()?
        .init();
    let estimates = nsm.fit_records(&mixtures)?;
    report("2-layer NSM", &sources, &estimates);

    // nonnegative PCA expects whitened mixtures, reuse the whitening layer of the NSM
    let whitened = whiten(&nsm, &mixtures);
    let mut pca = NonnegativePca::params(3, 3)
        .preset(Preset::ThreeDimSynthetic)
        .check()?
        .init();
    let estimates = pca.fit_records(&whitened)?;
    report("nonnegative PCA", &sources, &estimates);

    Ok(())
}

// Sparse nonnegative sources: each one is silent half of the time
// and uniform on (0, 1) otherwise, mixed by a fixed matrix
fn create_data(n_samples: usize) -> (Array2<f64>, Array2<f64>) {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let sources = Array2::random_using((n_samples, 3), Uniform::new(0.0, 1.0), &mut rng)
        .mapv(|v: f64| if v < 0.5 { 0.0 } else { 2.0 * (v - 0.5) });

    let mixing = array![[0.8, 0.3, 0.1], [0.2, 0.9, 0.3], [0.1, 0.2, 0.7]];
    let mixtures = sources.dot(&mixing.t());

    (sources, mixtures)
}

fn whiten(nsm: &TwoLayerNsm<f64>, mixtures: &Array2<f64>) -> Array2<f64> {
    let mean = mixtures.mean_axis(Axis(0)).unwrap();
    (mixtures - &mean).dot(&nsm.whx().t())
}

// Mean squared error between each source and its best matching, rescaled estimate
// over the last tenth of the stream
fn report(name: &str, sources: &Array2<f64>, estimates: &Array2<f64>) {
    let tail = sources.nrows() - sources.nrows() / 10;
    let sources = sources.slice(ndarray::s![tail.., ..]);
    let estimates = estimates.slice(ndarray::s![tail.., ..]);

    let mut errors = Vec::new();
    for source in sources.axis_iter(Axis(1)) {
        let best = estimates
            .axis_iter(Axis(1))
            .map(|estimate| {
                let scale = estimate.dot(&source) / estimate.dot(&estimate).max(1e-12);
                let mut err = 0.0;
                Zip::from(&source).and(&estimate).for_each(|&s, &e| {
                    err += (s - scale * e).powi(2);
                });
                err / source.len() as f64
            })
            .fold(f64::INFINITY, f64::min);
        errors.push(best);
    }
    println!("{:>16}: per-source MSE {:?}", name, errors);
}
