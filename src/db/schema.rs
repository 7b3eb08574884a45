table! {
    comentarios (id_comentario) {
        id_comentario -> Int4,
        id_publicacion -> Int4,
        id_usuario -> Int4,
        contenido -> Text,
        fecha_creacion -> Timestamp,
    }
}

table! {
    favoritos (id_favorito) {
        id_favorito -> Int4,
        id_usuario -> Int4,
        id_publicacion -> Int4,
        fecha_creacion -> Timestamp,
    }
}

table! {
    multimedia_publicacion (id_imagen) {
        id_imagen -> Int4,
        id_publicacion -> Int4,
        url -> Varchar,
        descripcion -> Text,
        orden -> Int4,
    }
}

table! {
    notificaciones (id_notificacion) {
        id_notificacion -> Int4,
        id_usuario -> Int4,
        id_origen -> Nullable<Int4>,
        tipo -> Text,
        id_referencia -> Int4,
        tipo_referencia -> Varchar,
        contenido -> Text,
        leida -> Bool,
        notificar_correo -> Bool,
        fecha_creacion -> Timestamp,
    }
}

table! {
    publicaciones (id_publicacion) {
        id_publicacion -> Int4,
        id_usuario -> Int4,
        id_tipo -> Int4,
        titulo -> Varchar,
        resumen -> Text,
        contenido -> Text,
        referencias -> Text,
        estado -> Text,
        imagen_portada -> Nullable<Varchar>,
        es_privada -> Bool,
        eliminado -> Bool,
        comentario_revision -> Nullable<Text>,
        revisor_id -> Nullable<Int4>,
        fecha_creacion -> Timestamp,
        fecha_publicacion -> Nullable<Timestamp>,
        fecha_eliminacion -> Nullable<Timestamp>,
    }
}

table! {
    tipos_publicacion (id_tipo) {
        id_tipo -> Int4,
        nombre -> Varchar,
        descripcion -> Text,
    }
}

table! {
    usuarios (id_usuario) {
        id_usuario -> Int4,
        nombre -> Varchar,
        correo -> Varchar,
        contrasena -> Varchar,
        rol -> Text,
        nombramiento -> Varchar,
        foto_perfil -> Nullable<Varchar>,
        fecha_creacion -> Timestamp,
        ultimo_acceso -> Nullable<Timestamp>,
    }
}

joinable!(comentarios -> publicaciones (id_publicacion));
joinable!(comentarios -> usuarios (id_usuario));
joinable!(favoritos -> publicaciones (id_publicacion));
joinable!(favoritos -> usuarios (id_usuario));
joinable!(multimedia_publicacion -> publicaciones (id_publicacion));
joinable!(notificaciones -> usuarios (id_usuario));
joinable!(publicaciones -> tipos_publicacion (id_tipo));
joinable!(publicaciones -> usuarios (id_usuario));

allow_tables_to_appear_in_same_query!(
    comentarios,
    favoritos,
    multimedia_publicacion,
    notificaciones,
    publicaciones,
    tipos_publicacion,
    usuarios,
);
