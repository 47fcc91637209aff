//! Country details command.

use anyhow::{Result, bail};
use colored::Colorize;
use futures::future::join_all;
use serde_json::Value;
use terra_abstraction::GraphqlError;
use terra_client::countries::{
    CountryDetails, CountryDetailsData, GET_COUNTRY_DETAILS, TRACK_COUNTRY_VIEW,
    TrackCountryViewData, country_details_tag, country_details_variables,
    track_country_view_variables,
};
use terra_client::{
    BatchedQuery, CacheDirective, ErrorPolicy, ExecuteOptions, LazyQuery, Mutation, QueryOutcome,
    RateLimitGate,
};

use super::report;
use crate::config::Clients;

/// Details are revalidated after an hour.
const DETAILS_REVALIDATE_SECS: u64 = 3600;

/// Execute the country command.
pub async fn execute(
    clients: &Clients,
    codes: &[String],
    cached: bool,
    track: bool,
    json_output: bool,
) -> Result<()> {
    let codes: Vec<String> = codes.iter().map(|code| code.trim().to_uppercase()).collect();
    if codes.iter().any(String::is_empty) {
        bail!("Country codes must not be empty");
    }

    if track {
        track_views(clients, &codes).await;
    }

    let outcomes = if cached { fetch_cached(clients, &codes).await } else { fetch_batched(clients, &codes).await };

    let mut results = Vec::with_capacity(codes.len());
    for (code, outcome) in codes.iter().zip(outcomes) {
        if let Some(error) = outcome.error {
            return Err(report(error, &clients.endpoint));
        }
        let details = outcome.data.and_then(|data| data.country);
        results.push((code.as_str(), details));
    }

    if json_output {
        let map: serde_json::Map<String, Value> = results
            .iter()
            .map(|(code, details)| Ok(((*code).to_string(), serde_json::to_value(details)?)))
            .collect::<Result<_, serde_json::Error>>()?;
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        for (code, details) in &results {
            print_details(code, details.as_ref());
        }
    }
    Ok(())
}

/// All codes share one general batch and one rate-limit gate.
async fn fetch_batched(clients: &Clients, codes: &[String]) -> Vec<QueryOutcome<CountryDetailsData>> {
    let gate = RateLimitGate::new();
    let queries: Vec<BatchedQuery<CountryDetailsData>> = codes
        .iter()
        .map(|code| {
            BatchedQuery::new(clients.batch.clone(), GET_COUNTRY_DETAILS)
                .with_variables(country_details_variables(code))
                .with_gate(gate.clone())
        })
        .collect();

    join_all(queries.iter().map(|query| query.execute())).await
}

/// One cached request per code, stopping at the first throttled response.
async fn fetch_cached(clients: &Clients, codes: &[String]) -> Vec<QueryOutcome<CountryDetailsData>> {
    let query: LazyQuery<CountryDetailsData> =
        LazyQuery::new(clients.single.clone(), GET_COUNTRY_DETAILS);

    let mut outcomes = Vec::with_capacity(codes.len());
    for code in codes {
        let options = ExecuteOptions {
            variables: Some(country_details_variables(code)),
            cache: Some(CacheDirective::after(DETAILS_REVALIDATE_SECS).with_tag(country_details_tag(code))),
            ..ExecuteOptions::default()
        };
        let outcome = query.execute(options).await;
        let throttled = outcome.error.as_ref().is_some_and(GraphqlError::is_rate_limited);
        outcomes.push(outcome);
        if throttled {
            break;
        }
    }
    outcomes
}

async fn track_views(clients: &Clients, codes: &[String]) {
    let mutation: Mutation<TrackCountryViewData> =
        Mutation::new(clients.single.clone(), TRACK_COUNTRY_VIEW).with_error_policy(ErrorPolicy::None);

    for code in codes {
        mutation
            .execute(ExecuteOptions::with_variables(track_country_view_variables(code, "view")))
            .await;
    }
}

fn print_details(code: &str, details: Option<&CountryDetails>) {
    let Some(details) = details else {
        println!("{} {}", code.bold(), "not found".yellow());
        return;
    };

    println!("{} {}", details.code.bold().cyan(), format!("+{}", details.phone).dimmed());

    let languages: Vec<String> =
        details.languages.iter().map(|l| format!("{} ({})", l.name, l.code)).collect();
    println!("  {} {}", "languages:".dimmed(), if languages.is_empty() { "-".to_string() } else { languages.join(", ") });

    if details.states.is_empty() {
        println!("  {} -", "states:".dimmed());
    } else {
        println!("  {} {}", "states:".dimmed(), details.states.len());
        for state in &details.states {
            match &state.code {
                Some(state_code) => println!("    {} {}", state_code, state.name),
                None => println!("    {}", state.name),
            }
        }
    }
}
