//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;
use tryapi_client::{Console, ReqwestTransport, RequestExecutor};
use tryapi_core::ApiDocument;
use tryapi_core::config::TryApiConfig;
use tryapi_openapi::OpenApiParser;

pub const PETSTORE_YAML: &str = r#"
openapi: 3.0.3
info:
  title: Petstore
  version: 1.0.0
servers:
  - url: https://petstore.example.com/v1
security:
  - bearerAuth: []
paths:
  /pets:
    get:
      operationId: listPets
      tags: [pets]
      parameters:
        - name: limit
          in: query
          schema:
            type: integer
        - name: X-Request-Id
          in: header
          schema:
            type: string
      responses:
        '200':
          description: A list of pets
          content:
            application/json:
              example:
                - id: 1
                  name: Rex
    post:
      operationId: createPet
      tags: [pets]
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/NewPet'
            examples:
              rex:
                summary: A dog
                value:
                  name: Rex
                  tag: dog
          application/x-www-form-urlencoded:
            schema:
              $ref: '#/components/schemas/NewPet'
      responses:
        '201':
          description: Created
  /pets/{petId}:
    parameters:
      - name: petId
        in: path
        required: true
        schema:
          type: integer
    get:
      operationId: getPet
      tags: [pets]
      security:
        - apiKey: []
      responses:
        '200':
          description: A pet
  /health:
    get:
      responses:
        '200':
          description: Up
components:
  schemas:
    NewPet:
      type: object
      required: [name]
      properties:
        name:
          type: string
        tag:
          type: string
  securitySchemes:
    bearerAuth:
      type: http
      scheme: bearer
    apiKey:
      type: apiKey
      in: query
      name: api_key
"#;

pub fn petstore() -> ApiDocument {
    OpenApiParser::from_str(PETSTORE_YAML)
        .and_then(|parser| parser.parse())
        .expect("petstore fixture parses")
}

/// Console over the petstore document aimed at `server`, with a global bearer token.
pub fn petstore_console(server: &str) -> Console {
    let config = TryApiConfig::parse(&format!(
        r#"
        [request]
        server = "{server}/v1"

        [authorization.schemes.bearerAuth]
        token = "t0k"
        "#
    ))
    .expect("config parses");

    let transport = ReqwestTransport::new().expect("client builds");
    Console::from_config(petstore(), &config, RequestExecutor::new(Arc::new(transport)))
        .expect("console builds")
}
