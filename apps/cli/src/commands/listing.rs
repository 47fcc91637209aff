//! Countries and continents listings.

use anyhow::Result;
use colored::Colorize;
use terra_client::QueueName;
use terra_client::countries::{
    ContinentsData, CountriesData, GET_CONTINENTS, GET_COUNTRIES,
};

use super::report;
use crate::config::Clients;

/// Execute the countries command.
pub async fn countries(clients: &Clients, json_output: bool) -> Result<()> {
    let data: CountriesData = clients
        .batch
        .request(QueueName::Critical, GET_COUNTRIES, None)
        .await
        .map_err(|e| report(e, &clients.endpoint))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        print_countries(&data);
    }
    Ok(())
}

/// Execute the continents command.
pub async fn continents(clients: &Clients, json_output: bool) -> Result<()> {
    let data: ContinentsData = clients
        .batch
        .request(QueueName::Critical, GET_CONTINENTS, None)
        .await
        .map_err(|e| report(e, &clients.endpoint))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        print_continents(&data);
    }
    Ok(())
}

/// Execute the overview command: both initial queries in one critical batch.
pub async fn overview(clients: &Clients, json_output: bool) -> Result<()> {
    let (countries, continents) = tokio::join!(
        clients.batch.request::<CountriesData>(QueueName::Critical, GET_COUNTRIES, None),
        clients.batch.request::<ContinentsData>(QueueName::Critical, GET_CONTINENTS, None),
    );
    let countries = countries.map_err(|e| report(e, &clients.endpoint))?;
    let continents = continents.map_err(|e| report(e, &clients.endpoint))?;

    if json_output {
        let combined = serde_json::json!({
            "countries": countries.countries,
            "continents": continents.continents,
        });
        println!("{}", serde_json::to_string_pretty(&combined)?);
    } else {
        print_continents(&continents);
        println!();
        print_countries(&countries);
    }
    Ok(())
}

fn print_countries(data: &CountriesData) {
    println!("{}", format!("Countries ({})", data.countries.len()).bold().cyan());
    for country in &data.countries {
        let capital = country.capital.as_deref().unwrap_or("-");
        let currency = country.currency.as_deref().unwrap_or("-");
        println!(
            "  {} {} {}  {} {}  {} {}  {}",
            country.emoji,
            country.code.bold(),
            country.name,
            "capital:".dimmed(),
            capital,
            "currency:".dimmed(),
            currency,
            country.continent.name.dimmed()
        );
    }
}

fn print_continents(data: &ContinentsData) {
    println!("{}", format!("Continents ({})", data.continents.len()).bold().cyan());
    for continent in &data.continents {
        println!(
            "  {} {} {}",
            continent.code.bold(),
            continent.name,
            format!("({} countries)", continent.countries.len()).dimmed()
        );
    }
}
