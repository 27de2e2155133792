// src/common/crypto.rs

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha512;
use subtle::ConstantTimeEq;

use crate::common::error::AppError;

// Parâmetros de derivação (310k recomendado pela OWASP para PBKDF2-SHA512)
const PBKDF2_ITERATIONS: u32 = 310_000;
const SALT_BYTES: usize = 32;
const HASH_BYTES: usize = 64;

/// Gera o hash de uma senha no formato `salt:iterações:hash`.
///
/// O salt é aleatório (32 bytes, hex) e fica embutido no próprio valor
/// armazenado, junto com o número de iterações — o `verify_password` lê
/// ambos de volta, então o custo pode ser aumentado no futuro sem
/// invalidar hashes antigos.
pub fn hash_password(password: &str) -> String {
    hash_password_with_iterations(password, PBKDF2_ITERATIONS)
}

pub(crate) fn hash_password_with_iterations(password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);

    let hash_hex = derive_hex(password, &salt_hex, iterations);
    format!("{salt_hex}:{iterations}:{hash_hex}")
}

/// Verifica uma senha contra um hash armazenado.
///
/// Hash malformado é um erro (e não "senha errada"): ele indica corrupção
/// de dados, nunca uma tentativa de login legítima.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let mut parts = stored_hash.splitn(3, ':');
    let (salt_hex, iterations_str, expected_hex) = match (parts.next(), parts.next(), parts.next())
    {
        (Some(s), Some(i), Some(h)) if !s.is_empty() && !h.is_empty() => (s, i, h),
        _ => return Err(anyhow::anyhow!("hash de senha armazenado é malformado").into()),
    };

    let iterations: u32 = iterations_str
        .parse()
        .map_err(|_| anyhow::anyhow!("contagem de iterações inválida no hash armazenado"))?;

    let computed_hex = derive_hex(password, salt_hex, iterations);

    // Comparação em tempo constante para não vazar o prefixo que bateu.
    Ok(computed_hex
        .as_bytes()
        .ct_eq(expected_hex.as_bytes())
        .into())
}

// O salt participa da derivação como a string hex, não como os bytes crus.
fn derive_hex(password: &str, salt_hex: &str, iterations: u32) -> String {
    let mut output = [0u8; HASH_BYTES];
    pbkdf2_hmac::<Sha512>(
        password.as_bytes(),
        salt_hex.as_bytes(),
        iterations,
        &mut output,
    );
    hex::encode(output)
}
