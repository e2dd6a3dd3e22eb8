use crate::{
    auth::{roles as roles_sistema, MAX_INTENTOS_FALLIDOS},
    db::DbPool,
    entities::{
        factura::{self, Entity as FacturaEntity},
        pedido::{self, Entity as PedidoEntity},
        rol::{self, Entity as RolEntity},
        usuario::{self, Entity as UsuarioEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::validacion::telefono_valido,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CrearUsuarioRequest {
    #[validate(length(min = 3, max = 50, message = "El nombre de usuario debe tener entre 3 y 50 caracteres"))]
    pub nombre_usuario: String,
    #[validate(length(min = 8, max = 100, message = "La contrasena debe tener al menos 8 caracteres"))]
    pub contrasena: String,
    #[validate(email(message = "El email no es valido"))]
    pub email: Option<String>,
    #[validate(length(max = 50, message = "El nombre admite hasta 50 caracteres"))]
    pub nombre: Option<String>,
    #[validate(length(max = 100, message = "Los apellidos admiten hasta 100 caracteres"))]
    pub apellidos: Option<String>,
    #[validate(length(max = 20, message = "El telefono admite hasta 20 caracteres"))]
    pub telefono: Option<String>,
    pub id_rol: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ActualizarUsuarioRequest {
    #[validate(length(min = 3, max = 50, message = "El nombre de usuario debe tener entre 3 y 50 caracteres"))]
    pub nombre_usuario: Option<String>,
    /// Solo cuando viene se genera un hash nuevo.
    #[validate(length(min = 8, max = 100, message = "La contrasena debe tener al menos 8 caracteres"))]
    pub contrasena: Option<String>,
    #[validate(email(message = "El email no es valido"))]
    pub email: Option<String>,
    #[validate(length(max = 50, message = "El nombre admite hasta 50 caracteres"))]
    pub nombre: Option<String>,
    #[validate(length(max = 100, message = "Los apellidos admiten hasta 100 caracteres"))]
    pub apellidos: Option<String>,
    #[validate(length(max = 20, message = "El telefono admite hasta 20 caracteres"))]
    pub telefono: Option<String>,
    pub id_rol: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CambiarContrasenaRequest {
    pub contrasena_actual: String,
    #[validate(length(min = 8, max = 100, message = "La contrasena nueva debe tener al menos 8 caracteres"))]
    pub contrasena_nueva: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EstadisticasUsuarios {
    pub total: u64,
    pub activos: u64,
    pub inactivos: u64,
    pub administradores: u64,
    pub vendedores: u64,
    pub bodegueros: u64,
}

#[derive(Debug, Clone)]
pub struct UsuarioConRol {
    pub usuario: usuario::Model,
    pub rol: Option<rol::Model>,
}

/// Hash Argon2id con sal aleatoria, en formato PHC.
pub fn hash_contrasena(contrasena: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(contrasena.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

fn verificar_contrasena(contrasena: &str, hash: &str) -> Result<bool, ServiceError> {
    let parseado = PasswordHash::new(hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(contrasena.as_bytes(), &parseado)
        .is_ok())
}

/// Cuentas de acceso y verificacion de credenciales. El bloqueo por
/// intentos fallidos vive aqui: cinco fallos seguidos dejan la cuenta
/// bloqueada hasta que un administrador la reactive.
#[derive(Clone)]
pub struct UsuarioService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl UsuarioService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Verifica credenciales y administra el contador de intentos.
    /// Todo rechazo responde lo mismo para no revelar que cuentas existen.
    #[instrument(skip(self, contrasena))]
    pub async fn login(
        &self,
        nombre_usuario: &str,
        contrasena: &str,
    ) -> Result<(usuario::Model, rol::Model), ServiceError> {
        let db = &*self.db_pool;

        let usuario = UsuarioEntity::find()
            .filter(usuario::Column::NombreUsuario.eq(nombre_usuario))
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch usuario for login");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::AuthError("Credenciales invalidas".to_string()))?;

        if !usuario.activo {
            return Err(ServiceError::AuthError(
                "La cuenta esta desactivada".to_string(),
            ));
        }

        if usuario.intentos_fallidos >= MAX_INTENTOS_FALLIDOS {
            return Err(ServiceError::AuthError(
                "La cuenta esta bloqueada por intentos fallidos repetidos".to_string(),
            ));
        }

        if !verificar_contrasena(contrasena, &usuario.contrasena)? {
            self.registrar_intento_fallido(usuario).await?;
            return Err(ServiceError::AuthError("Credenciales invalidas".to_string()));
        }

        let rol = RolEntity::find_by_id(usuario.id_rol)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, rol_id = usuario.id_rol, "Failed to fetch rol for login");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "El usuario {} tiene un rol inexistente",
                    usuario.nombre_usuario
                ))
            })?;

        if !rol.activo {
            return Err(ServiceError::AuthError(
                "La cuenta esta desactivada".to_string(),
            ));
        }

        let usuario_id = usuario.id_usuario;
        let nombre = usuario.nombre_usuario.clone();
        let mut activo: usuario::ActiveModel = usuario.into();
        activo.intentos_fallidos = Set(0);
        activo.ultimo_acceso = Set(Some(Utc::now().naive_utc()));
        activo.fecha_modificacion = Set(Utc::now().naive_utc());
        let usuario = activo.update(db).await.map_err(|e| {
            error!(error = %e, usuario_id, "Failed to record successful login");
            ServiceError::DatabaseError(e)
        })?;

        info!(usuario_id, nombre_usuario = %nombre, rol = %rol.nombre, "Sesion iniciada");

        if let Err(e) = self
            .event_sender
            .send(Event::SesionIniciada {
                usuario_id,
                nombre_usuario: nombre,
            })
            .await
        {
            warn!(error = %e, usuario_id, "Failed to send session event");
        }

        Ok((usuario, rol))
    }

    /// Lista paginada con el rol de cada cuenta.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<UsuarioConRol>, u64), ServiceError> {
        let db = &*self.db_pool;

        let paginator = UsuarioEntity::find()
            .order_by_asc(usuario::Column::NombreUsuario)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count usuarios");
            ServiceError::DatabaseError(e)
        })?;

        let usuarios = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(error = %e, page, per_page, "Failed to fetch usuarios page");
                ServiceError::DatabaseError(e)
            })?;

        let resultado = self.con_roles(usuarios).await?;
        Ok((resultado, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<UsuarioConRol, ServiceError> {
        let usuario = self.get_usuario(id).await?;
        let rol = self.rol_de(&usuario).await?;
        Ok(UsuarioConRol { usuario, rol })
    }

    /// Cuentas activas en orden alfabetico.
    #[instrument(skip(self))]
    pub async fn activos(&self) -> Result<Vec<UsuarioConRol>, ServiceError> {
        let db = &*self.db_pool;

        let usuarios = UsuarioEntity::find()
            .filter(usuario::Column::Activo.eq(true))
            .order_by_asc(usuario::Column::NombreUsuario)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch usuarios activos");
                ServiceError::DatabaseError(e)
            })?;

        self.con_roles(usuarios).await
    }

    /// Busqueda por nombre, apellidos o nombre de usuario, sin distinguir
    /// mayusculas.
    #[instrument(skip(self))]
    pub async fn buscar(&self, termino: &str) -> Result<Vec<UsuarioConRol>, ServiceError> {
        let db = &*self.db_pool;
        let patron = format!("%{}%", termino.to_lowercase());

        let usuarios = UsuarioEntity::find()
            .filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(usuario::Column::Nombre)))
                            .like(patron.as_str()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(usuario::Column::Apellidos)))
                            .like(patron.as_str()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(usuario::Column::NombreUsuario)))
                            .like(patron.as_str()),
                    ),
            )
            .order_by_asc(usuario::Column::NombreUsuario)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, termino, "Failed to search usuarios");
                ServiceError::DatabaseError(e)
            })?;

        self.con_roles(usuarios).await
    }

    #[instrument(skip(self, request), fields(nombre_usuario = %request.nombre_usuario))]
    pub async fn crear(&self, request: CrearUsuarioRequest) -> Result<UsuarioConRol, ServiceError> {
        request.validate()?;

        if let Some(telefono) = &request.telefono {
            if !telefono_valido(telefono) {
                return Err(ServiceError::ValidationError(
                    "El telefono solo admite digitos y guiones".to_string(),
                ));
            }
        }

        if self.nombre_usuario_en_uso(&request.nombre_usuario, None).await? {
            return Err(ServiceError::Conflict(format!(
                "Ya existe un usuario con el nombre {}",
                request.nombre_usuario
            )));
        }
        if let Some(email) = &request.email {
            if self.email_en_uso(email, None).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un usuario con el email {}",
                    email
                )));
            }
        }

        let rol = self.verificar_rol(request.id_rol).await?;

        let db = &*self.db_pool;
        let ahora = Utc::now().naive_utc();
        let nuevo = usuario::ActiveModel {
            nombre_usuario: Set(request.nombre_usuario),
            contrasena: Set(hash_contrasena(&request.contrasena)?),
            email: Set(request.email),
            nombre: Set(request.nombre),
            apellidos: Set(request.apellidos),
            telefono: Set(request.telefono),
            activo: Set(true),
            ultimo_acceso: Set(None),
            intentos_fallidos: Set(0),
            id_rol: Set(request.id_rol),
            fecha_creacion: Set(ahora),
            fecha_modificacion: Set(ahora),
            ..Default::default()
        };

        let model = nuevo.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to insert usuario");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            usuario_id = model.id_usuario,
            nombre_usuario = %model.nombre_usuario,
            rol = %rol.nombre,
            "Usuario creado"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::UsuarioCreado(model.id_usuario))
            .await
        {
            warn!(error = %e, usuario_id = model.id_usuario, "Failed to send usuario created event");
        }

        Ok(UsuarioConRol {
            usuario: model,
            rol: Some(rol),
        })
    }

    #[instrument(skip(self, request), fields(usuario_id = id))]
    pub async fn actualizar(
        &self,
        id: i64,
        request: ActualizarUsuarioRequest,
    ) -> Result<UsuarioConRol, ServiceError> {
        request.validate()?;

        if let Some(telefono) = &request.telefono {
            if !telefono_valido(telefono) {
                return Err(ServiceError::ValidationError(
                    "El telefono solo admite digitos y guiones".to_string(),
                ));
            }
        }

        let db = &*self.db_pool;
        let usuario = self.get_usuario(id).await?;

        if let Some(nombre_usuario) = &request.nombre_usuario {
            if self.nombre_usuario_en_uso(nombre_usuario, Some(id)).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un usuario con el nombre {}",
                    nombre_usuario
                )));
            }
        }
        if let Some(email) = &request.email {
            if self.email_en_uso(email, Some(id)).await? {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un usuario con el email {}",
                    email
                )));
            }
        }
        if let Some(id_rol) = request.id_rol {
            self.verificar_rol(id_rol).await?;
        }

        let mut activo: usuario::ActiveModel = usuario.into();
        if let Some(nombre_usuario) = request.nombre_usuario {
            activo.nombre_usuario = Set(nombre_usuario);
        }
        if let Some(contrasena) = request.contrasena {
            activo.contrasena = Set(hash_contrasena(&contrasena)?);
        }
        if let Some(email) = request.email {
            activo.email = Set(Some(email));
        }
        if let Some(nombre) = request.nombre {
            activo.nombre = Set(Some(nombre));
        }
        if let Some(apellidos) = request.apellidos {
            activo.apellidos = Set(Some(apellidos));
        }
        if let Some(telefono) = request.telefono {
            activo.telefono = Set(Some(telefono));
        }
        if let Some(id_rol) = request.id_rol {
            activo.id_rol = Set(id_rol);
        }
        activo.fecha_modificacion = Set(Utc::now().naive_utc());

        let model = activo.update(db).await.map_err(|e| {
            error!(error = %e, usuario_id = id, "Failed to update usuario");
            ServiceError::DatabaseError(e)
        })?;

        info!(usuario_id = id, "Usuario actualizado");

        if let Err(e) = self.event_sender.send(Event::UsuarioActualizado(id)).await {
            warn!(error = %e, usuario_id = id, "Failed to send usuario updated event");
        }

        let rol = self.rol_de(&model).await?;
        Ok(UsuarioConRol { usuario: model, rol })
    }

    /// Cambio de contrasena verificando la vigente.
    #[instrument(skip(self, request), fields(usuario_id = id))]
    pub async fn cambiar_contrasena(
        &self,
        id: i64,
        request: CambiarContrasenaRequest,
    ) -> Result<(), ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let usuario = self.get_usuario(id).await?;

        if !verificar_contrasena(&request.contrasena_actual, &usuario.contrasena)? {
            return Err(ServiceError::ValidationError(
                "La contrasena actual es incorrecta".to_string(),
            ));
        }

        let mut activo: usuario::ActiveModel = usuario.into();
        activo.contrasena = Set(hash_contrasena(&request.contrasena_nueva)?);
        activo.fecha_modificacion = Set(Utc::now().naive_utc());

        activo.update(db).await.map_err(|e| {
            error!(error = %e, usuario_id = id, "Failed to update contrasena");
            ServiceError::DatabaseError(e)
        })?;

        info!(usuario_id = id, "Contrasena cambiada");

        if let Err(e) = self.event_sender.send(Event::UsuarioActualizado(id)).await {
            warn!(error = %e, usuario_id = id, "Failed to send usuario updated event");
        }

        Ok(())
    }

    /// Activa o desactiva la cuenta. Reactivarla limpia el contador de
    /// intentos fallidos, que es la via para desbloquear una cuenta.
    #[instrument(skip(self))]
    pub async fn cambiar_estado(&self, id: i64, activo: bool) -> Result<usuario::Model, ServiceError> {
        let db = &*self.db_pool;
        let usuario = self.get_usuario(id).await?;

        let mut activo_model: usuario::ActiveModel = usuario.into();
        activo_model.activo = Set(activo);
        if activo {
            activo_model.intentos_fallidos = Set(0);
        }
        activo_model.fecha_modificacion = Set(Utc::now().naive_utc());

        let model = activo_model.update(db).await.map_err(|e| {
            error!(error = %e, usuario_id = id, "Failed to change usuario estado");
            ServiceError::DatabaseError(e)
        })?;

        info!(usuario_id = id, activo, "Estado de usuario cambiado");

        if let Err(e) = self
            .event_sender
            .send(Event::UsuarioEstadoCambiado {
                usuario_id: id,
                activo,
            })
            .await
        {
            warn!(error = %e, usuario_id = id, "Failed to send usuario estado event");
        }

        Ok(model)
    }

    /// Borrado fisico, bloqueado mientras existan documentos a su nombre.
    #[instrument(skip(self))]
    pub async fn eliminar(&self, id: i64) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let usuario = self.get_usuario(id).await?;

        let facturas = FacturaEntity::find()
            .filter(factura::Column::IdUsuario.eq(id))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, usuario_id = id, "Failed to count facturas of usuario");
                ServiceError::DatabaseError(e)
            })?;
        if facturas > 0 {
            return Err(ServiceError::Conflict(format!(
                "No se puede eliminar el usuario: tiene {} facturas asociadas",
                facturas
            )));
        }

        let pedidos = PedidoEntity::find()
            .filter(pedido::Column::IdUsuario.eq(id))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, usuario_id = id, "Failed to count pedidos of usuario");
                ServiceError::DatabaseError(e)
            })?;
        if pedidos > 0 {
            return Err(ServiceError::Conflict(format!(
                "No se puede eliminar el usuario: tiene {} pedidos asociados",
                pedidos
            )));
        }

        UsuarioEntity::delete_by_id(id).exec(db).await.map_err(|e| {
            error!(error = %e, usuario_id = id, "Failed to delete usuario");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            usuario_id = id,
            nombre_usuario = %usuario.nombre_usuario,
            "Usuario eliminado"
        );

        if let Err(e) = self.event_sender.send(Event::UsuarioEliminado(id)).await {
            warn!(error = %e, usuario_id = id, "Failed to send usuario deleted event");
        }

        Ok(())
    }

    /// Conteos de cuentas; los cortes por rol consideran solo activas.
    #[instrument(skip(self))]
    pub async fn estadisticas(&self) -> Result<EstadisticasUsuarios, ServiceError> {
        let db = &*self.db_pool;

        let total = UsuarioEntity::find().count(db).await.map_err(|e| {
            error!(error = %e, "Failed to count usuarios");
            ServiceError::DatabaseError(e)
        })?;

        let activos = UsuarioEntity::find()
            .filter(usuario::Column::Activo.eq(true))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to count usuarios activos");
                ServiceError::DatabaseError(e)
            })?;

        let administradores = self.contar_por_rol(roles_sistema::ADMINISTRADOR).await?;
        let vendedores = self.contar_por_rol(roles_sistema::VENDEDOR).await?;
        let bodegueros = self.contar_por_rol(roles_sistema::BODEGUERO).await?;

        Ok(EstadisticasUsuarios {
            total,
            activos,
            inactivos: total - activos,
            administradores,
            vendedores,
            bodegueros,
        })
    }

    async fn registrar_intento_fallido(&self, usuario: usuario::Model) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let usuario_id = usuario.id_usuario;
        let nombre_usuario = usuario.nombre_usuario.clone();
        let intentos = usuario.intentos_fallidos + 1;

        let mut activo: usuario::ActiveModel = usuario.into();
        activo.intentos_fallidos = Set(intentos);
        activo.fecha_modificacion = Set(Utc::now().naive_utc());
        activo.update(db).await.map_err(|e| {
            error!(error = %e, usuario_id, "Failed to record failed login attempt");
            ServiceError::DatabaseError(e)
        })?;

        warn!(
            usuario_id,
            nombre_usuario = %nombre_usuario,
            intentos_fallidos = intentos,
            "Intento de inicio de sesion fallido"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::LoginFallido {
                nombre_usuario: nombre_usuario.clone(),
                intentos_fallidos: intentos,
            })
            .await
        {
            warn!(error = %e, usuario_id, "Failed to send login failed event");
        }

        if intentos >= MAX_INTENTOS_FALLIDOS {
            if let Err(e) = self
                .event_sender
                .send(Event::UsuarioBloqueado {
                    usuario_id,
                    nombre_usuario,
                })
                .await
            {
                warn!(error = %e, usuario_id, "Failed to send usuario blocked event");
            }
        }

        Ok(())
    }

    async fn con_roles(
        &self,
        usuarios: Vec<usuario::Model>,
    ) -> Result<Vec<UsuarioConRol>, ServiceError> {
        let db = &*self.db_pool;

        let rol_ids: Vec<i64> = usuarios.iter().map(|u| u.id_rol).collect();
        let roles: HashMap<i64, rol::Model> = RolEntity::find()
            .filter(rol::Column::IdRol.is_in(rol_ids))
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch roles for usuarios");
                ServiceError::DatabaseError(e)
            })?
            .into_iter()
            .map(|r| (r.id_rol, r))
            .collect();

        Ok(usuarios
            .into_iter()
            .map(|u| {
                let rol = roles.get(&u.id_rol).cloned();
                UsuarioConRol { usuario: u, rol }
            })
            .collect())
    }

    async fn rol_de(&self, usuario: &usuario::Model) -> Result<Option<rol::Model>, ServiceError> {
        let db = &*self.db_pool;

        RolEntity::find_by_id(usuario.id_rol)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, rol_id = usuario.id_rol, "Failed to fetch rol");
                ServiceError::DatabaseError(e)
            })
    }

    async fn get_usuario(&self, id: i64) -> Result<usuario::Model, ServiceError> {
        let db = &*self.db_pool;

        UsuarioEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, usuario_id = id, "Failed to fetch usuario");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Usuario con ID {} no encontrado", id)))
    }

    async fn verificar_rol(&self, id_rol: i64) -> Result<rol::Model, ServiceError> {
        let db = &*self.db_pool;

        let rol = RolEntity::find_by_id(id_rol)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, rol_id = id_rol, "Failed to fetch rol");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("El rol con ID {} no existe", id_rol))
            })?;

        if !rol.activo {
            return Err(ServiceError::ValidationError(format!(
                "El rol {} esta inactivo",
                rol.nombre
            )));
        }

        Ok(rol)
    }

    async fn contar_por_rol(&self, nombre_rol: &str) -> Result<u64, ServiceError> {
        let db = &*self.db_pool;

        let rol = RolEntity::find()
            .filter(rol::Column::Nombre.eq(nombre_rol))
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, rol = nombre_rol, "Failed to fetch rol by nombre");
                ServiceError::DatabaseError(e)
            })?;

        let Some(rol) = rol else {
            return Ok(0);
        };

        UsuarioEntity::find()
            .filter(usuario::Column::IdRol.eq(rol.id_rol))
            .filter(usuario::Column::Activo.eq(true))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, rol = nombre_rol, "Failed to count usuarios by rol");
                ServiceError::DatabaseError(e)
            })
    }

    async fn nombre_usuario_en_uso(
        &self,
        nombre_usuario: &str,
        excluir: Option<i64>,
    ) -> Result<bool, ServiceError> {
        let db = &*self.db_pool;

        let mut consulta =
            UsuarioEntity::find().filter(usuario::Column::NombreUsuario.eq(nombre_usuario));
        if let Some(id) = excluir {
            consulta = consulta.filter(usuario::Column::IdUsuario.ne(id));
        }

        let total = consulta.count(db).await.map_err(|e| {
            error!(error = %e, "Failed to check nombre_usuario uniqueness");
            ServiceError::DatabaseError(e)
        })?;

        Ok(total > 0)
    }

    async fn email_en_uso(&self, email: &str, excluir: Option<i64>) -> Result<bool, ServiceError> {
        let db = &*self.db_pool;

        let mut consulta = UsuarioEntity::find().filter(usuario::Column::Email.eq(email));
        if let Some(id) = excluir {
            consulta = consulta.filter(usuario::Column::IdUsuario.ne(id));
        }

        let total = consulta.count(db).await.map_err(|e| {
            error!(error = %e, "Failed to check email uniqueness");
            ServiceError::DatabaseError(e)
        })?;

        Ok(total > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_y_verificacion_de_contrasena() {
        let hash = hash_contrasena("ferreteria2026").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verificar_contrasena("ferreteria2026", &hash).unwrap());
        assert!(!verificar_contrasena("otra-clave", &hash).unwrap());
    }

    #[test]
    fn hashes_distintos_por_sal_aleatoria() {
        let primero = hash_contrasena("misma-clave").unwrap();
        let segundo = hash_contrasena("misma-clave").unwrap();
        assert_ne!(primero, segundo);
        assert!(verificar_contrasena("misma-clave", &primero).unwrap());
        assert!(verificar_contrasena("misma-clave", &segundo).unwrap());
    }

    #[test]
    fn contrasena_corta_no_pasa_validacion() {
        let request = CrearUsuarioRequest {
            nombre_usuario: "operador1".to_string(),
            contrasena: "corta".to_string(),
            email: None,
            nombre: None,
            apellidos: None,
            telefono: None,
            id_rol: 1,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn email_invalido_no_pasa_validacion() {
        let request = ActualizarUsuarioRequest {
            nombre_usuario: None,
            contrasena: None,
            email: Some("sin-arroba".to_string()),
            nombre: None,
            apellidos: None,
            telefono: None,
            id_rol: None,
        };
        assert!(request.validate().is_err());
    }
}
