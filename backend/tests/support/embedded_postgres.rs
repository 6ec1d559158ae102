//! Embedded PostgreSQL provisioning for persistence tests.
//!
//! Database reset and schema setup go through the `postgres` client rather
//! than Diesel so `DROP DATABASE` is not entangled with Diesel transaction
//! semantics. The schema DDL here must stay in line with the Diesel table
//! definitions in `src/outbound/persistence/schema.rs`.

use pg_embedded_setup_unpriv::TestCluster;
use postgres::{Client, NoTls};

use super::format_postgres_error;

/// Maintenance database used for create/drop statements.
const ADMIN_DB: &str = "postgres";

const SCHEMA_DDL: &str = "
CREATE TABLE users (
    id UUID PRIMARY KEY,
    email VARCHAR(320) NOT NULL UNIQUE,
    email_verified BOOLEAN NOT NULL DEFAULT FALSE,
    first_name VARCHAR NOT NULL,
    last_name VARCHAR NOT NULL,
    password_hash VARCHAR NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE listings (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    listing_type VARCHAR NOT NULL,
    energy_type VARCHAR NOT NULL,
    volume DOUBLE PRECISION NOT NULL,
    price DOUBLE PRECISION NOT NULL,
    location VARCHAR NOT NULL,
    description VARCHAR,
    start_time TIMESTAMPTZ NOT NULL,
    end_time TIMESTAMPTZ NOT NULL,
    status VARCHAR NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE swaps (
    id UUID PRIMARY KEY,
    listing_id UUID NOT NULL REFERENCES listings (id) ON DELETE CASCADE,
    initiator_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    recipient_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    proposed_volume DOUBLE PRECISION NOT NULL,
    proposed_price DOUBLE PRECISION,
    message TEXT,
    status VARCHAR NOT NULL,
    proposed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    responded_at TIMESTAMPTZ,
    completed_at TIMESTAMPTZ
);
";

fn admin_client(cluster: &TestCluster) -> Result<Client, String> {
    let url = cluster.connection().database_url(ADMIN_DB);
    Client::connect(&url, NoTls).map_err(|err| format_postgres_error(&err))
}

/// Drop and recreate the named test database.
pub fn reset_database(cluster: &TestCluster, name: &str) -> Result<(), String> {
    let mut client = admin_client(cluster)?;
    client
        .batch_execute(&format!("DROP DATABASE IF EXISTS {name};"))
        .map_err(|err| format_postgres_error(&err))?;
    client
        .batch_execute(&format!("CREATE DATABASE {name};"))
        .map_err(|err| format_postgres_error(&err))?;
    Ok(())
}

/// Create the marketplace tables in the database at `url`.
pub fn create_schema(url: &str) -> Result<(), String> {
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    client
        .batch_execute(SCHEMA_DDL)
        .map_err(|err| format_postgres_error(&err))?;
    Ok(())
}
