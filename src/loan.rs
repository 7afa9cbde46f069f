//! Fixed-rate loan amortization.

use thiserror::Error;

use crate::render::{thousands, thousands_trunc, BOOTSTRAP_CSS};

const SCHEDULE_STYLE: &str = r#"
<style>
    th, td { text-align: center; }
    td:nth-child(1) { text-align: right; }
    td:nth-child(2) { text-align: right; }
    td:nth-child(3) { text-align: right; }
    td:nth-child(4) { text-align: right; }
    td:nth-child(5) { text-align: right; }
</style>
"#;

/// Longest accepted term
pub const MAX_YEARS: u32 = 100;

const HEADERS: [&str; 5] = ["期數", "未償還貸款", "償還本金", "支付利息", "供款"];

#[derive(Debug, Error, PartialEq)]
pub enum LoanError {
    #[error("貸款期限必須大於 0 年")]
    ZeroTerm,
    #[error("貸款期限不可超過 {MAX_YEARS} 年")]
    TermTooLong,
    #[error("貸款金額與年利率不可為負數")]
    Negative,
    #[error("貸款金額與年利率必須為有效數字")]
    NotANumber,
}

/// Loan terms as entered by the user
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loan {
    pub amount: f64,
    /// Percent per year
    pub annual_rate: f64,
    pub years: u32,
}

/// One month of the schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Installment {
    pub period: u32,
    pub remaining: f64,
    pub principal: f64,
    pub interest: f64,
    pub payment: f64,
}

impl Loan {
    pub fn new(amount: f64, annual_rate: f64, years: u32) -> Result<Self, LoanError> {
        if years == 0 {
            return Err(LoanError::ZeroTerm);
        }
        if years > MAX_YEARS {
            return Err(LoanError::TermTooLong);
        }
        if !(amount.is_finite() && annual_rate.is_finite()) {
            return Err(LoanError::NotANumber);
        }
        if amount < 0.0 || annual_rate < 0.0 {
            return Err(LoanError::Negative);
        }
        Ok(Self {
            amount,
            annual_rate,
            years,
        })
    }

    pub fn months(&self) -> u32 {
        self.years * 12
    }

    fn monthly_rate(&self) -> f64 {
        self.annual_rate / 12.0 / 100.0
    }

    /// Annuity payment; an interest-free loan is split evenly
    pub fn monthly_payment(&self) -> f64 {
        let rate = self.monthly_rate();
        let months = self.months() as f64;
        if rate == 0.0 {
            return self.amount / months;
        }
        let growth = (1.0 + rate).powf(months);
        self.amount * rate * growth / (growth - 1.0)
    }

    pub fn total_payment(&self) -> f64 {
        self.monthly_payment() * self.months() as f64
    }

    pub fn total_interest(&self) -> f64 {
        self.total_payment() - self.amount
    }

    pub fn schedule(&self) -> Vec<Installment> {
        let rate = self.monthly_rate();
        let payment = self.monthly_payment();
        let mut remaining = self.amount;

        (1..=self.months())
            .map(|period| {
                let interest = remaining * rate;
                let principal = payment - interest;
                remaining -= principal;
                Installment {
                    period,
                    remaining,
                    principal,
                    interest,
                    payment,
                }
            })
            .collect()
    }
}

/// Summary lines followed by the full repayment table
pub fn render_report(loan: &Loan) -> String {
    let mut html = String::new();
    html.push_str(&format!(
        "<p>每月還款金額 : {}</p><p>總利息 : {}</p><p>還款總金額 : {}</p><p>貸款每月還款表</p>",
        thousands_trunc(loan.monthly_payment()),
        thousands_trunc(loan.total_interest()),
        thousands_trunc(loan.total_payment())
    ));
    html.push_str(&format!("<link href=\"{}\" rel=\"stylesheet\">", BOOTSTRAP_CSS));
    html.push_str(SCHEDULE_STYLE);
    html.push_str("<table border=\"1\" class=\"dataframe table table-striped\">\n");
    html.push_str("  <thead>\n    <tr style=\"text-align: right;\">\n");
    for header in HEADERS {
        html.push_str(&format!("      <th>{}</th>\n", header));
    }
    html.push_str("    </tr>\n  </thead>\n  <tbody>\n");

    for row in loan.schedule() {
        html.push_str(&format!(
            "    <tr>\n      <td>{}</td>\n      <td>{}</td>\n      <td>{}</td>\n      <td>{}</td>\n      <td>{}</td>\n    </tr>\n",
            row.period,
            thousands(row.remaining),
            thousands(row.principal),
            thousands(row.interest),
            thousands(row.payment)
        ));
    }

    html.push_str("  </tbody>\n</table>");
    html
}

/// Validate the terms and render the report, or the validation message
pub fn calculate(amount: f64, annual_rate: f64, years: u32) -> String {
    match Loan::new(amount, annual_rate, years) {
        Ok(loan) => render_report(&loan),
        Err(e) => e.to_string(),
    }
}
