// Demodulation of a 1D amplitude-modulated signal built from a
// harmonic carrier and a sinusoidal modulator, using AP-Basic

use std::f64::consts::PI;
use std::process::ExitCode;

use ap_demod::{demodulate, Algorithm, Parameters};

/// Amplitude/phase pairs of the harmonic carrier.
const WEIGHTS: [f64; 40] = [
    0.4170, 0.7203, 0.0001, 0.3023, 0.1468, 0.0923, 0.1863, 0.3456, 0.3968, 0.5388, 0.4192,
    0.6852, 0.2045, 0.8781, 0.0274, 0.6705, 0.4173, 0.5587, 0.1404, 0.1981, 0.8007, 0.9683,
    0.3134, 0.6923, 0.8764, 0.8946, 0.0850, 0.0391, 0.1698, 0.8781, 0.0983, 0.4211, 0.9579,
    0.5332, 0.6919, 0.3155, 0.6865, 0.8346, 0.0183, 0.7501,
];

pub fn main() -> ExitCode {
    env_logger::init();

    const N: usize = 16384;
    let dt = 25.0 / (N - 1) as f64;

    // Modulator (nonnegative sinusoidal)
    let modulator: Vec<f64> = (0..N)
        .map(|i| (1.01 + (2.0 * PI * i as f64 * dt).cos()) / 2.01)
        .collect();

    // Carrier (harmonic)
    let carrier: Vec<f64> = (0..N)
        .map(|i| {
            let mut c = 0.0;
            for j in 0..10 {
                let base = (256 * (j + 1)) as f64 * i as f64 / N as f64;
                c += WEIGHTS[4 * j] * (2.0 * PI * (base + WEIGHTS[1 + 4 * j])).cos();
                let shifted = (256 * (j + 1) + 128) as f64 * i as f64 / N as f64;
                c += 0.01 * WEIGHTS[2 + 4 * j] * (2.0 * PI * (shifted + WEIGHTS[3 + 4 * j])).cos();
            }
            c / 2.628456776936774
        })
        .collect();

    let signal: Vec<f64> = modulator
        .iter()
        .zip(&carrier)
        .map(|(m, c)| m * c)
        .collect();

    let params = Parameters::new(
        Algorithm::Basic,
        1,
        vec![1.0 / dt],
        vec![1.5],
        1e-5,
        1000,
        vec![N],
    );

    let mut m_out = vec![0.0; N];
    let mut e_out = vec![0.0; 1];
    match demodulate(&signal, &params, None, None, &mut m_out, &mut e_out) {
        Ok(iterations) => {
            println!("Demodulation completed.");
            println!("The infeasibility error is {:e}.", e_out[0]);
            println!("The number of used iterations is {}.", iterations);

            // Carrier estimate from the recovered envelope
            let worst_carrier = m_out
                .iter()
                .zip(&signal)
                .zip(&carrier)
                .map(|((m, s), c)| (s / m - c).abs())
                .fold(0.0, f64::max);
            let worst_envelope = m_out
                .iter()
                .zip(&modulator)
                .map(|(est, m)| (est - m).abs())
                .fold(0.0, f64::max);
            println!("Largest envelope deviation: {:e}", worst_envelope);
            println!("Largest carrier deviation: {:e}", worst_carrier);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
