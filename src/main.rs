use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use roadside_dispatch::config::{DatabaseConfig, EnvironmentConfig, StorageBackend};
use roadside_dispatch::database;
use roadside_dispatch::routes::create_app_router;
use roadside_dispatch::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🛻 Roadside Dispatch - API de asistencia en ruta");
    info!("================================================");

    let config = EnvironmentConfig::from_env()?;
    info!("⚙️ Entorno: {}", config.environment);

    let state = match config.storage {
        StorageBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = match database::create_pool(&db_config).await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {:#}", e);
                    return Err(e);
                }
            };
            database::run_migrations(&pool).await?;
            AppState::from_pool(pool, config.clone())
        }
        StorageBackend::Memory => {
            warn!("🧪 STORAGE=memory: los datos no se persisten");
            AppState::in_memory(config.clone())
        }
    };

    if config.cors_origins.is_empty() && !config.is_development() {
        warn!("⚠️ CORS_ORIGINS vacío: CORS permisivo fuera de desarrollo");
    }

    let app = create_app_router(state);
    info!("🌐 Servidor iniciando en http://{}", config.server_url());
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🆘 Requests:");
    info!("   POST /request - Crear request");
    info!("   GET  /request - Listar requests");
    info!("   GET  /request/:id - Obtener request");
    info!("   GET  /request/user/:user_id - Requests de un usuario");
    info!("   GET  /request/partner/:partner_id - Requests de un partner");
    info!("   GET  /request/service?service_type_id= - Requests por tipo de servicio");
    info!("   GET  /request/nearby?latitude=&longitude=&radius_km= - Requests pendientes cercanas");
    info!("   PATCH /request/:id/status - Cambiar estado");
    info!("   POST /request/:id/cancel - Cancelar (admin)");
    info!("   POST /request/:id/complete - Completar (admin)");
    info!("💰 Transacciones:");
    info!("   POST /transaction - Crear transacción");
    info!("   GET  /transaction - Listar transacciones");
    info!("   GET  /transaction/request/:request_id - Transacción de una request");
    info!("   GET  /transaction/user/:user_id - Transacciones de un usuario");
    info!("   GET  /transaction/partner/:partner_id - Transacciones de un partner");
    info!("   PATCH /transaction/:id/status - Cambiar estado de pago");
    info!("   POST /transaction/:id/tax - Recalcular impuesto");
    info!("   POST /transaction/:id/refund - Reembolsar");
    info!("🚗 Verificaciones:");
    info!("   POST /carVerification - Solicitar verificación");
    info!("   GET  /carVerification - Listar verificaciones");
    info!("   GET  /carVerification/:id - Obtener verificación");
    info!("   GET  /carVerification/user/:user_id - Verificaciones de un usuario");
    info!("   PATCH /carVerification/:id/verify - Resolver verificación");
    info!("   POST /carVerification/:id/guarantee - Emitir garantía");
    info!("   GET  /carVerification/:id/guarantee - Obtener garantía");
    info!("   GET  /carVerification/:id/guarantee/validity - Vigencia de la garantía");
    info!("📍 Ubicaciones:");
    info!("   PUT  /location/partner - Publicar ubicación de partner");
    info!("   PUT  /location/user - Actualizar ubicación de usuario");
    info!("   GET  /location/partner/:partner_id - Ubicación de partner");
    info!("   GET  /location/user/:user_id - Ubicación de usuario");
    info!("   GET  /location/nearby-partners - Partners cercanos");
    info!("🤝 Partners:");
    info!("   POST /partner - Alta desde solicitud aprobada");
    info!("   GET  /partner - Listar partners");
    info!("   GET  /partner/:id - Obtener partner");
    info!("   PATCH /partner/:id - Actualizar perfil");
    info!("   GET  /partner/service?service_type_id= - Partners disponibles por servicio");
    info!("   PATCH /partner/:id/availability - Cambiar disponibilidad");
    info!("   POST /partner/:id/ban - Banear");
    info!("   POST /partner/:id/unban - Rehabilitar");
    info!("   DELETE /partner/:id - Eliminar");

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal SIGTERM recibida, apagando servidor...");
        },
    }
}
