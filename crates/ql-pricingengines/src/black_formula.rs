//! Black 1976 formula and its inversion (translates
//! `ql/pricingengines/blackformula.hpp`).
//!
//! Prices are in terms of the forward `F`, the total standard deviation
//! `σ√T` of `ln F` and the discount factor to the payment date:
//!
//! $$V = D\,\phi\,\big(F N(\phi d_1) - K N(\phi d_2)\big), \qquad
//! d_{1,2} = \frac{\ln(F/K)}{\sigma\sqrt T} \pm \tfrac12 \sigma\sqrt T$$

use ql_core::{ensure, errors::Result, Real};
use ql_instruments::OptionType;
use ql_math::distributions::normal_cdf;
use ql_math::Brent;
use std::f64::consts::PI;

/// Black price of a European option.
///
/// Corresponds to `QuantLib::blackFormula`.
pub fn black_formula(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: Real,
) -> Result<Real> {
    check_inputs(strike, forward, std_dev, discount)?;
    let w = option_type.sign();
    if std_dev == 0.0 {
        return Ok((w * (forward - strike)).max(0.0) * discount);
    }
    if strike == 0.0 {
        return Ok(match option_type {
            OptionType::Call => forward * discount,
            OptionType::Put => 0.0,
        });
    }
    let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
    let d2 = d1 - std_dev;
    let result = discount * w * (forward * normal_cdf(w * d1) - strike * normal_cdf(w * d2));
    // rounding below zero deep out of the money
    Ok(result.max(0.0))
}

/// Corrado–Miller approximation of the implied standard deviation, used as
/// the default starting point of the inversion.
///
/// Corresponds to `QuantLib::blackFormulaImpliedStdDevApproximation`.
pub fn black_formula_implied_std_dev_approximation(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    price: Real,
    discount: Real,
) -> Result<Real> {
    check_inputs(strike, forward, 0.0, discount)?;
    ensure!(price >= 0.0, "option price ({price}) must be non-negative");
    let std_dev = if strike == forward {
        price / discount * (2.0 * PI).sqrt() / forward
    } else {
        let moneyness = option_type.sign() * (forward - strike);
        let temp = price / discount - 0.5 * moneyness;
        // the approximation breaks down far from the money; clamp at zero
        let temp2 = (temp * temp - moneyness * moneyness / PI).max(0.0).sqrt();
        (temp + temp2) * (2.0 * PI).sqrt() / (forward + strike)
    };
    ensure!(
        std_dev >= 0.0,
        "implied std dev approximation ({std_dev}) must be non-negative"
    );
    Ok(std_dev)
}

/// Standard deviation `σ√T` reproducing `price` in the Black formula.
///
/// `guess` defaults to the Corrado–Miller approximation. Fails with
/// [`Error::Convergence`](ql_core::Error::Convergence) when the solver
/// does not converge within `max_iterations` evaluations.
///
/// Corresponds to `QuantLib::blackFormulaImpliedStdDev`.
#[allow(clippy::too_many_arguments)]
pub fn black_formula_implied_std_dev(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    price: Real,
    discount: Real,
    guess: Option<Real>,
    accuracy: Real,
    max_iterations: usize,
) -> Result<Real> {
    check_inputs(strike, forward, 0.0, discount)?;
    let intrinsic = black_formula(option_type, strike, forward, 0.0, discount)?;
    ensure!(
        price >= intrinsic,
        "option price ({price}) must not be lower than intrinsic value ({intrinsic})"
    );
    let upper = match option_type {
        OptionType::Call => forward * discount,
        OptionType::Put => strike * discount,
    };
    ensure!(
        price < upper,
        "option price ({price}) must be lower than its upper bound ({upper})"
    );
    if price == intrinsic {
        return Ok(0.0);
    }
    let guess = match guess {
        Some(g) => g,
        None => black_formula_implied_std_dev_approximation(
            option_type,
            strike,
            forward,
            price,
            discount,
        )?,
    };
    ensure!(guess >= 0.0, "std dev guess ({guess}) must be non-negative");

    let solver = Brent::new()
        .with_max_evaluations(max_iterations)
        .with_lower_bound(0.0);
    let step = guess.max(0.01) * 0.5;
    solver.solve(
        |sd| {
            // inputs are validated above, so the formula cannot fail here
            black_formula(option_type, strike, forward, sd, discount).unwrap_or(Real::NAN) - price
        },
        accuracy,
        guess,
        step,
    )
}

fn check_inputs(strike: Real, forward: Real, std_dev: Real, discount: Real) -> Result<()> {
    ensure!(strike >= 0.0, "strike ({strike}) must be non-negative");
    ensure!(forward > 0.0, "forward ({forward}) must be positive");
    ensure!(std_dev >= 0.0, "std dev ({std_dev}) must be non-negative");
    ensure!(discount > 0.0, "discount ({discount}) must be positive");
    Ok(())
}
