// src/services/pre_registration_service.rs
//! Persistência das pré-matrículas e das suas cobranças.
use crate::{
    error::AppResult,
    gateway::BillingType,
    models::pre_registration::{ChargeRecord, NovaPreMatricula, PaymentStatus, PreRegistration, CHARGE_REQUESTING},
};
use sqlx::SqlitePool;
use uuid::Uuid;

const PRE_REGISTRATION_COLUMNS: &str = r#"
    id, nome, email, telefone, cpf, idade, plano, horario, dia_preferencia,
    observacoes, amount, postal_code, address_number, complement, address,
    city, province, gateway_customer_id, payment_method, payment_status, created_at
"#;

const CHARGE_COLUMNS: &str =
    "id, pre_registration_id, billing_type, gateway_charge_id, status, created_at";

pub async fn create(db_pool: &SqlitePool, nova: &NovaPreMatricula) -> AppResult<PreRegistration> {
    let id = Uuid::new_v4().to_string();
    let sql = format!(
        r#"
        INSERT INTO pre_registrations (
            id, nome, email, telefone, cpf, idade, plano, horario, dia_preferencia,
            observacoes, amount, postal_code, address_number, complement, payment_status
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        RETURNING {PRE_REGISTRATION_COLUMNS}
        "#
    );
    let registro = sqlx::query_as::<_, PreRegistration>(&sql)
        .bind(&id)
        .bind(&nova.nome)
        .bind(&nova.email)
        .bind(&nova.telefone)
        .bind(&nova.cpf)
        .bind(nova.idade)
        .bind(&nova.plano)
        .bind(&nova.horario)
        .bind(&nova.dia_preferencia)
        .bind(&nova.observacoes)
        .bind(nova.amount)
        .bind(&nova.postal_code)
        .bind(&nova.address_number)
        .bind(&nova.complement)
        .bind(PaymentStatus::Pending)
        .fetch_one(db_pool)
        .await?;

    tracing::info!("Pré-matrícula {} gravada ({})", registro.id, registro.email);
    Ok(registro)
}

pub async fn find(db_pool: &SqlitePool, id: &str) -> AppResult<Option<PreRegistration>> {
    let sql = format!("SELECT {PRE_REGISTRATION_COLUMNS} FROM pre_registrations WHERE id = ?1");
    let registro = sqlx::query_as::<_, PreRegistration>(&sql)
        .bind(id)
        .fetch_optional(db_pool)
        .await?;
    Ok(registro)
}

/// Todas as pré-matrículas, das mais recentes para as mais antigas.
pub async fn list(db_pool: &SqlitePool) -> AppResult<Vec<PreRegistration>> {
    let sql = format!(
        "SELECT {PRE_REGISTRATION_COLUMNS} FROM pre_registrations ORDER BY created_at DESC, rowid DESC"
    );
    let registros = sqlx::query_as::<_, PreRegistration>(&sql)
        .fetch_all(db_pool)
        .await?;
    Ok(registros)
}

pub async fn set_customer_id(db_pool: &SqlitePool, id: &str, customer_id: &str) -> AppResult {
    sqlx::query("UPDATE pre_registrations SET gateway_customer_id = ?1 WHERE id = ?2")
        .bind(customer_id)
        .bind(id)
        .execute(db_pool)
        .await?;
    tracing::info!("Pré-matrícula {} ligada ao cliente {}", id, customer_id);
    Ok(())
}

/// Reservas sem id do gateway mais antigas do que isto são consideradas
/// abandonadas (pedido interrompido, processo reiniciado). Tem de ser maior
/// que o timeout do cliente HTTP do gateway.
pub const STALE_RESERVATION_SECS: i64 = 120;

/// Resultado de [`reserve_charge_slot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotReservation {
    /// Vaga nova.
    Fresh,
    /// Reserva abandonada retomada; a cobrança pode já existir no gateway.
    Reclaimed,
    /// Já existe cobrança (ou reserva recente) deste tipo.
    Taken,
}

/// Reserva a vaga da cobrança `billing_type` antes de chamar o gateway.
///
/// A restrição UNIQUE(pre_registration_id, billing_type) garante que só um
/// pedido concorrente ganha. Uma reserva sem id do gateway com mais de
/// [`STALE_RESERVATION_SECS`] é retomada por quem pedir a seguir.
pub async fn reserve_charge_slot(
    db_pool: &SqlitePool,
    pre_registration_id: &str,
    billing_type: BillingType,
) -> AppResult<SlotReservation> {
    let result = sqlx::query(
        r#"
        INSERT INTO charges (pre_registration_id, billing_type, status)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (pre_registration_id, billing_type) DO NOTHING
        "#,
    )
    .bind(pre_registration_id)
    .bind(billing_type)
    .bind(CHARGE_REQUESTING)
    .execute(db_pool)
    .await?;

    if result.rows_affected() == 1 {
        tracing::debug!("Vaga {} reservada para {}", billing_type, pre_registration_id);
        return Ok(SlotReservation::Fresh);
    }

    // Renovar created_at faz com que só um pedido retome a mesma reserva
    let reclaimed = sqlx::query(
        r#"
        UPDATE charges
        SET status = ?3, created_at = CURRENT_TIMESTAMP
        WHERE pre_registration_id = ?1 AND billing_type = ?2
          AND gateway_charge_id IS NULL
          AND created_at <= datetime('now', ?4)
        "#,
    )
    .bind(pre_registration_id)
    .bind(billing_type)
    .bind(CHARGE_REQUESTING)
    .bind(format!("-{STALE_RESERVATION_SECS} seconds"))
    .execute(db_pool)
    .await?;

    if reclaimed.rows_affected() == 1 {
        tracing::warn!(
            "Reserva {} abandonada de {} retomada",
            billing_type,
            pre_registration_id
        );
        Ok(SlotReservation::Reclaimed)
    } else {
        Ok(SlotReservation::Taken)
    }
}

/// Preenche a reserva com o id e o estado devolvidos pelo gateway.
pub async fn attach_gateway_charge(
    db_pool: &SqlitePool,
    pre_registration_id: &str,
    billing_type: BillingType,
    gateway_charge_id: &str,
    status: &str,
) -> AppResult {
    sqlx::query(
        r#"
        UPDATE charges
        SET gateway_charge_id = ?1, status = ?2
        WHERE pre_registration_id = ?3 AND billing_type = ?4
        "#,
    )
    .bind(gateway_charge_id)
    .bind(status)
    .bind(pre_registration_id)
    .bind(billing_type)
    .execute(db_pool)
    .await?;
    tracing::info!(
        "Cobrança {} ({}) associada a {}",
        gateway_charge_id,
        billing_type,
        pre_registration_id
    );
    Ok(())
}

/// Liberta uma reserva que nunca chegou a ter cobrança no gateway.
pub async fn release_charge_slot(
    db_pool: &SqlitePool,
    pre_registration_id: &str,
    billing_type: BillingType,
) -> AppResult {
    sqlx::query(
        r#"
        DELETE FROM charges
        WHERE pre_registration_id = ?1 AND billing_type = ?2 AND gateway_charge_id IS NULL
        "#,
    )
    .bind(pre_registration_id)
    .bind(billing_type)
    .execute(db_pool)
    .await?;
    tracing::debug!("Vaga {} libertada para {}", billing_type, pre_registration_id);
    Ok(())
}

pub async fn find_charges(db_pool: &SqlitePool, pre_registration_id: &str) -> AppResult<Vec<ChargeRecord>> {
    let sql = format!("SELECT {CHARGE_COLUMNS} FROM charges WHERE pre_registration_id = ?1 ORDER BY id");
    let charges = sqlx::query_as::<_, ChargeRecord>(&sql)
        .bind(pre_registration_id)
        .fetch_all(db_pool)
        .await?;
    Ok(charges)
}

pub async fn find_charge(
    db_pool: &SqlitePool,
    pre_registration_id: &str,
    billing_type: BillingType,
) -> AppResult<Option<ChargeRecord>> {
    let sql = format!(
        "SELECT {CHARGE_COLUMNS} FROM charges WHERE pre_registration_id = ?1 AND billing_type = ?2"
    );
    let charge = sqlx::query_as::<_, ChargeRecord>(&sql)
        .bind(pre_registration_id)
        .bind(billing_type)
        .fetch_optional(db_pool)
        .await?;
    Ok(charge)
}

pub async fn find_charge_by_gateway_id(
    db_pool: &SqlitePool,
    gateway_charge_id: &str,
) -> AppResult<Option<ChargeRecord>> {
    let sql = format!("SELECT {CHARGE_COLUMNS} FROM charges WHERE gateway_charge_id = ?1");
    let charge = sqlx::query_as::<_, ChargeRecord>(&sql)
        .bind(gateway_charge_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(charge)
}

pub async fn update_charge_status(db_pool: &SqlitePool, gateway_charge_id: &str, status: &str) -> AppResult {
    sqlx::query("UPDATE charges SET status = ?1 WHERE gateway_charge_id = ?2")
        .bind(status)
        .bind(gateway_charge_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

/// Marca a pré-matrícula como paga pelo meio `billing_type`.
///
/// Só altera registos ainda `pending`: o meio do primeiro pagamento fica,
/// mesmo que outra cobrança seja paga depois. Devolve `true` se mudou algo.
pub async fn mark_paid(db_pool: &SqlitePool, id: &str, billing_type: BillingType) -> AppResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE pre_registrations
        SET payment_status = ?1, payment_method = ?2
        WHERE id = ?3 AND payment_status = ?4
        "#,
    )
    .bind(PaymentStatus::Paid)
    .bind(billing_type)
    .bind(id)
    .bind(PaymentStatus::Pending)
    .execute(db_pool)
    .await?;

    let changed = result.rows_affected() == 1;
    if changed {
        tracing::info!("💰 Pré-matrícula {} paga via {}", id, billing_type);
    } else {
        tracing::debug!("Pré-matrícula {} já estava paga; {} ignorado", id, billing_type);
    }
    Ok(changed)
}
