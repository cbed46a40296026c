// Demodulation of a sparse spike train under a piecewise upper bound,
// using AP-Accelerated with and without the bound

use std::f64::consts::PI;
use std::process::ExitCode;

use ap_demod::{demodulate, Algorithm, Parameters};

/// Amplitude/phase pairs of the low-pass random modulator.
const WEIGHTS: [f64; 20] = [
    1.5648, 0.5312, 0.1413, 0.7588, -0.8616, -0.3586, 0.9106, -0.1787, -0.0108, -0.0989, -0.3559,
    -0.4015, 0.2917, -0.3458, -1.1990, 0.7651, -0.9884, -1.1668, 0.6584, -1.3693,
];

/// Spacings between consecutive carrier spikes.
const SPIKE_STEPS: [usize; 27] = [
    0, 38, 46, 27, 35, 30, 29, 32, 36, 37, 41, 38, 45, 32, 50, 27, 45, 38, 42, 30, 32, 48, 53, 35,
    45, 50, 51,
];

fn run(
    signal: &[f64],
    params: &Parameters,
    upper: Option<&[f64]>,
    label: &str,
) -> Result<(), ExitCode> {
    let mut m_out = vec![0.0; signal.len()];
    let mut e_out = vec![0.0; 1];
    match demodulate(signal, params, upper, None, &mut m_out, &mut e_out) {
        Ok(iterations) => {
            println!("Demodulation {} completed.", label);
            println!("The infeasibility error is {:e}.", e_out[0]);
            println!("The number of used iterations is {}.", iterations);
            Ok(())
        }
        Err(e) => {
            println!("Error: {}", e);
            Err(ExitCode::FAILURE)
        }
    }
}

pub fn main() -> ExitCode {
    env_logger::init();

    const N: usize = 1024;
    let dt = 10.0 / (N - 1) as f64;

    // Modulator (a low-pass random signal)
    let modulator: Vec<f64> = (0..N)
        .map(|i| {
            let mut m = 0.0;
            for j in 0..10 {
                m += WEIGHTS[2 * j]
                    * (2.0 * PI * j as f64 * i as f64 / N as f64 + WEIGHTS[2 * j + 1]).cos();
            }
            (m + 2.131185657756246) / 7.926671964919291
        })
        .collect();

    // Carrier (a random-spikes signal)
    let mut carrier = vec![0.0; N];
    let mut pos = 0;
    for &step in &SPIKE_STEPS {
        pos += step;
        carrier[pos] = 1.0;
    }

    let signal: Vec<f64> = modulator
        .iter()
        .zip(&carrier)
        .map(|(m, c)| m * c)
        .collect();

    let fs = 1.0 / dt;
    let params = Parameters::new(
        Algorithm::Accelerated,
        1,
        vec![fs],
        vec![10.0 * fs / N as f64],
        -1.0,
        1000,
        vec![N],
    );

    if let Err(code) = run(&signal, &params, None, "without the upper bound") {
        return code;
    }

    // Piecewise upper bound on the modulator
    let mut upper = vec![0.0; N];
    upper[..120].iter_mut().for_each(|u| *u = 0.59);
    upper[120..160].iter_mut().for_each(|u| *u = 0.27);
    upper[160..300].iter_mut().for_each(|u| *u = 0.59);
    upper[300..400].iter_mut().for_each(|u| *u = 1.0);
    upper[400..1023].iter_mut().for_each(|u| *u = 0.71);
    upper[1023] = 0.311;

    if let Err(code) = run(&signal, &params, Some(&upper), "with the upper bound") {
        return code;
    }
    ExitCode::SUCCESS
}
